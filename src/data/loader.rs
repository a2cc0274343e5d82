//! Readers for the two MNIST distributions in common use.
//!
//! CSV: one example per line, `label,p0,p1,…` with raw `0..=255` pixel
//! values.  A header row is skipped when any of its cells is non-numeric.
//!
//! IDX: the binary image/label file pair.
//! ```text
//! images (IDX3): 00 00 08 03 | N:u32be | rows:u32be | cols:u32be | N*rows*cols u8
//! labels (IDX1): 00 00 08 01 | N:u32be | N u8
//! ```
//!
//! Pixels are normalised to `p / 255 - 0.5` in both cases.

use std::fs;
use std::path::Path;

use log::info;

use crate::data::dataset::Dataset;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

fn normalize(pixel: f64) -> f64 {
    pixel / 255.0 - 0.5
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub fn load_csv(path: &Path, num_classes: usize) -> Result<Dataset> {
    info!("Loading MNIST csv dataset from {}", path.display());
    let text = fs::read_to_string(path)
        .map_err(|e| Error::dataset(path, format!("cannot read file: {}", e)))?;
    let ds = parse_csv(path, &text, num_classes)?;
    info!("Loaded {} samples with {} features", ds.len(), ds.feature_len());
    Ok(ds)
}

/// Parses CSV text; `path` is only used in error messages.
pub fn parse_csv(path: &Path, text: &str, num_classes: usize) -> Result<Dataset> {
    let mut lines = text.lines().enumerate().peekable();

    if let Some((_, first)) = lines.peek() {
        if is_header(first) {
            lines.next();
        }
    }

    let mut pixels: Vec<f64> = Vec::new();
    let mut labels: Vec<usize> = Vec::new();
    let mut n_features: Option<usize> = None;

    for (line_idx, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_no = line_idx + 1;
        let mut cells = line.split(',').map(str::trim);

        let label_cell = cells.next().unwrap_or_default();
        let label: usize = label_cell.parse().map_err(|_| {
            Error::dataset(path, format!("line {}: label '{}' is not a class index", line_no, label_cell))
        })?;
        if label >= num_classes {
            return Err(Error::dataset(
                path,
                format!("line {}: label {} >= num_classes {}", line_no, label, num_classes),
            ));
        }

        let before = pixels.len();
        for cell in cells {
            let value: f64 = cell.parse().map_err(|_| {
                Error::dataset(path, format!("line {}: '{}' is not a valid number", line_no, cell))
            })?;
            pixels.push(normalize(value));
        }
        let width = pixels.len() - before;

        match n_features {
            None if width == 0 => {
                return Err(Error::dataset(path, format!("line {}: no pixel columns", line_no)));
            }
            None => n_features = Some(width),
            Some(expected) if expected != width => {
                return Err(Error::dataset(
                    path,
                    format!("line {}: {} pixel columns, expected {}", line_no, width, expected),
                ));
            }
            Some(_) => {}
        }
        labels.push(label);
    }

    let cols = n_features.ok_or_else(|| Error::dataset(path, "no data rows"))?;
    Dataset::new(Matrix::from_vec(labels.len(), cols, pixels), labels, num_classes)
}

fn is_header(line: &str) -> bool {
    line.split(',').any(|c| {
        let t = c.trim();
        !t.is_empty() && t.parse::<f64>().is_err()
    })
}

// ---------------------------------------------------------------------------
// IDX
// ---------------------------------------------------------------------------

/// Loads the `(train, test)` pair from a directory holding the four standard
/// MNIST IDX files.
pub fn load_idx_dir(dir: &Path, num_classes: usize) -> Result<(Dataset, Dataset)> {
    let train = load_idx(&dir.join(TRAIN_IMAGES), &dir.join(TRAIN_LABELS), num_classes)?;
    let test = load_idx(&dir.join(TEST_IMAGES), &dir.join(TEST_LABELS), num_classes)?;
    Ok((train, test))
}

pub fn load_idx(images: &Path, labels: &Path, num_classes: usize) -> Result<Dataset> {
    info!("Loading MNIST idx dataset from {}", images.display());
    let image_bytes = fs::read(images)
        .map_err(|e| Error::dataset(images, format!("cannot read file: {}", e)))?;
    let label_bytes = fs::read(labels)
        .map_err(|e| Error::dataset(labels, format!("cannot read file: {}", e)))?;
    let ds = parse_idx(images, &image_bytes, &label_bytes, num_classes)?;
    info!("Loaded {} samples with {} features", ds.len(), ds.feature_len());
    Ok(ds)
}

fn be_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}

fn check_magic(path: &Path, bytes: &[u8], dims: u8, header_len: usize, what: &str) -> Result<()> {
    if bytes.len() < header_len {
        return Err(Error::dataset(
            path,
            format!("{} file too short: {} bytes, header needs {}", what, bytes.len(), header_len),
        ));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 || bytes[2] != 0x08 || bytes[3] != dims {
        return Err(Error::dataset(
            path,
            format!(
                "{} file: bad magic {:02X} {:02X} {:02X} {:02X}, expected 00 00 08 {:02X}",
                what, bytes[0], bytes[1], bytes[2], bytes[3], dims
            ),
        ));
    }
    Ok(())
}

/// Parses an IDX3 image buffer and its IDX1 label buffer.
pub fn parse_idx(path: &Path, image_bytes: &[u8], label_bytes: &[u8], num_classes: usize) -> Result<Dataset> {
    check_magic(path, image_bytes, 0x03, 16, "IDX image")?;
    check_magic(path, label_bytes, 0x01, 8, "IDX label")?;

    let n_items = be_u32(image_bytes, 4);
    let n_pixels = be_u32(image_bytes, 8)
        .checked_mul(be_u32(image_bytes, 12))
        .ok_or_else(|| Error::dataset(path, "rows * cols overflows"))?;
    let data_len = n_items
        .checked_mul(n_pixels)
        .ok_or_else(|| Error::dataset(path, "image data length overflows"))?;

    if image_bytes.len() < 16 + data_len {
        return Err(Error::dataset(
            path,
            format!(
                "IDX image file declares {} images of {} pixels but holds only {} bytes",
                n_items, n_pixels, image_bytes.len()
            ),
        ));
    }
    let n_labels = be_u32(label_bytes, 4);
    if n_labels != n_items {
        return Err(Error::dataset(
            path,
            format!("image file declares {} items but label file declares {}", n_items, n_labels),
        ));
    }
    if label_bytes.len() < 8 + n_items {
        return Err(Error::dataset(path, "IDX label file is truncated"));
    }
    if n_pixels == 0 {
        return Err(Error::dataset(path, "IDX images have no pixels"));
    }

    let pixels = image_bytes[16..16 + data_len]
        .iter()
        .map(|&p| normalize(p as f64))
        .collect();
    let labels: Vec<usize> = label_bytes[8..8 + n_items].iter().map(|&l| l as usize).collect();
    if let Some((i, &label)) = labels.iter().enumerate().find(|(_, &l)| l >= num_classes) {
        return Err(Error::dataset(
            path,
            format!("label at index {} is {}, out of range for {} classes", i, label, num_classes),
        ));
    }

    Dataset::new(Matrix::from_vec(n_items, n_pixels, pixels), labels, num_classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> &'static Path {
        Path::new("inline")
    }

    #[test]
    fn csv_with_header_and_normalisation() {
        let text = "label,p0,p1\n3,0,255\n1,51,102\n";
        let ds = parse_csv(p(), text, 10).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.feature_len(), 2);
        assert_eq!(ds.labels(), &[3, 1]);
        assert_eq!(ds.inputs().row(0), &[-0.5, 0.5]);
        assert!((ds.inputs().get(1, 0) - (0.2 - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn csv_without_header_keeps_first_row() {
        let ds = parse_csv(p(), "0,1,2\n\n1,3,4\n", 2).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn csv_rejects_ragged_rows() {
        let err = parse_csv(p(), "0,1,2\n1,3\n", 2).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }

    #[test]
    fn csv_rejects_label_out_of_range() {
        assert!(parse_csv(p(), "7,1,2\n", 5).is_err());
    }

    #[test]
    fn csv_needs_rows() {
        assert!(parse_csv(p(), "label,p0\n", 10).is_err());
    }

    fn idx_pair(labels: &[u8], rows: u32, cols: u32) -> (Vec<u8>, Vec<u8>) {
        let n = labels.len() as u32;
        let mut images = vec![0, 0, 8, 3];
        images.extend_from_slice(&n.to_be_bytes());
        images.extend_from_slice(&rows.to_be_bytes());
        images.extend_from_slice(&cols.to_be_bytes());
        images.extend((0..n * rows * cols).map(|i| (i % 256) as u8));

        let mut label_bytes = vec![0, 0, 8, 1];
        label_bytes.extend_from_slice(&n.to_be_bytes());
        label_bytes.extend_from_slice(labels);
        (images, label_bytes)
    }

    #[test]
    fn idx_round_trip_of_a_tiny_pair() {
        let (images, labels) = idx_pair(&[4, 9, 0], 2, 2);
        let ds = parse_idx(p(), &images, &labels, 10).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.feature_len(), 4);
        assert_eq!(ds.labels(), &[4, 9, 0]);
        assert_eq!(ds.inputs().get(0, 0), -0.5);
        assert!((ds.inputs().get(2, 3) - (11.0 / 255.0 - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn idx_rejects_bad_magic_and_count_mismatch() {
        let (mut images, labels) = idx_pair(&[1, 2], 2, 2);
        images[3] = 0x01;
        assert!(parse_idx(p(), &images, &labels, 10).is_err());

        let (images, _) = idx_pair(&[1, 2], 2, 2);
        let (_, labels) = idx_pair(&[1], 2, 2);
        assert!(parse_idx(p(), &images, &labels, 10).is_err());
    }

    #[test]
    fn idx_rejects_truncated_images() {
        let (mut images, labels) = idx_pair(&[1, 2], 2, 2);
        images.truncate(images.len() - 1);
        assert!(parse_idx(p(), &images, &labels, 10).is_err());
    }
}
