//! Append-only record of a run's metrics and its persisted form.
//!
//! An open `MetricLog` only accepts new entries.  `finalize` consumes it and
//! attaches the test accuracy, producing a `CompletedLog` that can be read
//! and saved but never extended.
//!
//! On disk a log is either a NumPy `.npz` archive (the layout `np.savez`
//! produces) or a JSON document with the same keys.  The file extension
//! picks the format; anything but `.npz` is JSON.

use std::fs;
use std::io;
use std::path::Path;

use npyz::npz::{NpzArchive, NpzWriter};
use npyz::{DType, NpyFile, TypeChar, WriterBuilder};

use log::info;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricEntry {
    /// Value of the global step counter before the logged batch bumped it.
    pub global_step: u64,
    pub loss: f64,
    pub val_accuracy: f64,
    pub val_accuracy_on_train: f64,
}

#[derive(Debug, Default)]
pub struct MetricLog {
    entries: Vec<MetricEntry>,
}

impl MetricLog {
    pub fn new() -> MetricLog {
        MetricLog::default()
    }

    pub fn push(&mut self, entry: MetricEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MetricEntry] {
        &self.entries
    }

    pub fn finalize(self, test_accuracy: f64) -> CompletedLog {
        CompletedLog { entries: self.entries, test_accuracy }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedLog {
    entries: Vec<MetricEntry>,
    test_accuracy: f64,
}

impl CompletedLog {
    pub fn entries(&self) -> &[MetricEntry] {
        &self.entries
    }

    pub fn test_accuracy(&self) -> f64 {
        self.test_accuracy
    }

    /// Column-oriented view, one array per metric.
    pub fn to_archive(&self) -> LogArchive {
        LogArchive {
            loss: self.entries.iter().map(|e| e.loss).collect(),
            steps: self.entries.iter().map(|e| e.global_step).collect(),
            val_accuracy: self.entries.iter().map(|e| e.val_accuracy).collect(),
            test_accuracy: self.test_accuracy,
            val_accuracy_on_train: self.entries.iter().map(|e| e.val_accuracy_on_train).collect(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.to_archive().save(path)?;
        info!("Saved metric log ({} entries) to {}", self.entries.len(), path.display());
        Ok(())
    }
}

/// The on-disk metric log, shared with runs from other frameworks.
///
/// `loss`, `steps` and `val_accuracy` are parallel arrays.  Non-finite
/// numbers are written as `null` and read back as NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogArchive {
    #[serde(deserialize_with = "nan_vec")]
    pub loss: Vec<f64>,
    pub steps: Vec<u64>,
    #[serde(deserialize_with = "nan_vec")]
    pub val_accuracy: Vec<f64>,
    #[serde(deserialize_with = "nan_scalar")]
    pub test_accuracy: f64,
    #[serde(default, deserialize_with = "nan_vec")]
    pub val_accuracy_on_train: Vec<f64>,
}

impl LogArchive {
    /// Reads `path` as `.npz` or JSON depending on its extension.
    pub fn load(path: &Path) -> Result<LogArchive> {
        if is_npz(path) {
            LogArchive::load_npz(path)
        } else {
            LogArchive::load_json(path)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if is_npz(path) {
            self.save_npz(path)
        } else {
            self.save_json(path)
        }
    }

    pub fn load_json(path: &Path) -> Result<LogArchive> {
        let text = fs::read_to_string(path)?;
        let archive: LogArchive = serde_json::from_str(&text)?;
        archive.check_lengths(path)?;
        Ok(archive)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reads an archive written by `np.savez`.  Float arrays may be `f4` or
    /// `f8`, `steps` any signed or unsigned integer type, and `test_accuracy`
    /// a 0-d array.
    pub fn load_npz(path: &Path) -> Result<LogArchive> {
        let mut npz = NpzArchive::open(path)?;

        let loss = read_floats(path, required(path, npz.by_name("loss")?, "loss")?)?;
        let steps = read_steps(path, required(path, npz.by_name("steps")?, "steps")?)?;
        let val_accuracy = read_floats(path, required(path, npz.by_name("val_accuracy")?, "val_accuracy")?)?;
        let test_accuracy = read_floats(path, required(path, npz.by_name("test_accuracy")?, "test_accuracy")?)?;
        let val_accuracy_on_train = match npz.by_name("val_accuracy_on_train")? {
            Some(npy) => read_floats(path, npy)?,
            None => Vec::new(),
        };

        let test_accuracy = match test_accuracy.as_slice() {
            [value] => *value,
            other => {
                return Err(Error::dataset(
                    path,
                    format!("test_accuracy holds {} values, expected a scalar", other.len()),
                ))
            }
        };

        let archive = LogArchive { loss, steps, val_accuracy, test_accuracy, val_accuracy_on_train };
        archive.check_lengths(path)?;
        Ok(archive)
    }

    /// Writes the arrays as `f8`/`u8` `.npy` members; `test_accuracy` is 0-d.
    pub fn save_npz(&self, path: &Path) -> Result<()> {
        let mut npz = NpzWriter::create(path)?;
        write_array(&mut npz, "loss", &[self.loss.len() as u64], self.loss.iter().copied())?;
        write_array(&mut npz, "steps", &[self.steps.len() as u64], self.steps.iter().copied())?;
        write_array(
            &mut npz,
            "val_accuracy",
            &[self.val_accuracy.len() as u64],
            self.val_accuracy.iter().copied(),
        )?;
        write_array(&mut npz, "test_accuracy", &[], std::iter::once(self.test_accuracy))?;
        write_array(
            &mut npz,
            "val_accuracy_on_train",
            &[self.val_accuracy_on_train.len() as u64],
            self.val_accuracy_on_train.iter().copied(),
        )?;
        Ok(())
    }

    fn check_lengths(&self, path: &Path) -> Result<()> {
        if self.loss.len() != self.steps.len() || self.val_accuracy.len() != self.steps.len() {
            return Err(Error::dataset(
                path,
                format!(
                    "metric arrays differ in length: {} loss, {} steps, {} val_accuracy",
                    self.loss.len(),
                    self.steps.len(),
                    self.val_accuracy.len()
                ),
            ));
        }
        Ok(())
    }
}

fn is_npz(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("npz"))
}

fn required<T>(path: &Path, npy: Option<T>, name: &str) -> Result<T> {
    npy.ok_or_else(|| Error::dataset(path, format!("archive has no '{}' array", name)))
}

fn plain_type(path: &Path, npy: &NpyFile<impl io::Read>) -> Result<(TypeChar, u64)> {
    match npy.dtype() {
        DType::Plain(ts) => Ok((ts.type_char(), ts.size_field())),
        other => Err(Error::dataset(path, format!("unsupported dtype {}", other.descr()))),
    }
}

fn read_floats(path: &Path, npy: NpyFile<impl io::Read>) -> Result<Vec<f64>> {
    match plain_type(path, &npy)? {
        (TypeChar::Float, 4) => Ok(npy.into_vec::<f32>()?.into_iter().map(f64::from).collect()),
        (TypeChar::Float, 8) => Ok(npy.into_vec::<f64>()?),
        (kind, size) => Err(Error::dataset(
            path,
            format!("expected a float array, found {:?} of {} bytes", kind, size),
        )),
    }
}

fn read_steps(path: &Path, npy: NpyFile<impl io::Read>) -> Result<Vec<u64>> {
    let signed = match plain_type(path, &npy)? {
        (TypeChar::Uint, 8) => return Ok(npy.into_vec::<u64>()?),
        (TypeChar::Uint, 4) => return Ok(npy.into_vec::<u32>()?.into_iter().map(u64::from).collect()),
        (TypeChar::Int, 8) => npy.into_vec::<i64>()?,
        (TypeChar::Int, 4) => npy.into_vec::<i32>()?.into_iter().map(i64::from).collect(),
        (kind, size) => {
            return Err(Error::dataset(
                path,
                format!("expected an integer steps array, found {:?} of {} bytes", kind, size),
            ))
        }
    };
    signed
        .into_iter()
        .map(|s| u64::try_from(s).map_err(|_| Error::dataset(path, format!("negative step {}", s))))
        .collect()
}

fn write_array<W, T, I>(npz: &mut NpzWriter<W>, name: &str, shape: &[u64], values: I) -> Result<()>
where
    W: io::Write + io::Seek,
    T: npyz::AutoSerialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = npz.array(name, Default::default())?.default_dtype().shape(shape).begin_nd()?;
    writer.extend(values)?;
    writer.finish()?;
    Ok(())
}

fn nan_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn nan_vec<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error> {
    let values = Vec::<Option<f64>>::deserialize(deserializer)?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}
