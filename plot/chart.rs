//! SVG rendering of two accuracy curves on one step axis.

use mnist_sgd::LogArchive;

/// One run to draw.
pub struct Series<'a> {
    pub name: &'a str,
    pub color: &'a str,
    pub archive: &'a LogArchive,
}

const W: f64 = 760.0;
const H: f64 = 320.0;
const PAD_L: f64 = 60.0;
const PAD_R: f64 = 16.0;
const PAD_T: f64 = 28.0;
const PAD_B: f64 = 30.0;

const GREY_GRID: &str = "#f0f2f5";
const GREY_TEXT: &str = "#999";
const DARK_TEXT: &str = "#333";

/// Validation accuracy (%) against global step for every series, with the
/// final test accuracy of each drawn as a dotted horizontal line.
pub fn build_svg_accuracy_chart(series: &[Series<'_>]) -> String {
    let max_step = series
        .iter()
        .flat_map(|s| s.archive.steps.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let px = |step: f64, accuracy: f64| -> (f64, f64) {
        let x = PAD_L + step / max_step * (W - PAD_L - PAD_R);
        let y = PAD_T + (100.0 - accuracy * 100.0) / 100.0 * (H - PAD_T - PAD_B);
        (x, y)
    };

    // Y axis: 0..100 %.
    let y_labels: String = (0..=5)
        .map(|g| {
            let pct = g as f64 * 20.0;
            let (_, y) = px(0.0, pct / 100.0);
            format!(
                "<text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" fill=\"{}\" font-size=\"10\">{:.0}%</text>\n\
                 <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>",
                PAD_L - 4.0, y + 4.0, GREY_TEXT, pct,
                PAD_L, y, W - PAD_R, y, GREY_GRID
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let x_labels: String = [0.0, max_step / 2.0, max_step]
        .iter()
        .map(|&step| {
            let (x, _) = px(step, 0.0);
            format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"10\">{:.0}</text>",
                x, H - 4.0, GREY_TEXT, step
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut curves = String::new();
    let mut legend = String::new();
    for (i, s) in series.iter().enumerate() {
        let path = polyline(
            s.archive.steps.iter().zip(&s.archive.val_accuracy).map(|(&step, &acc)| (step as f64, acc)),
            &px,
        );
        if !path.is_empty() {
            curves.push_str(&format!(
                "<path d=\"{}\" stroke=\"{}\" stroke-width=\"2\" fill=\"none\"/>\n",
                path, s.color
            ));
        }
        if s.archive.test_accuracy.is_finite() {
            let (_, y) = px(0.0, s.archive.test_accuracy);
            curves.push_str(&format!(
                "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1.5\" stroke-dasharray=\"2,3\"/>\n",
                PAD_L, y, W - PAD_R, y, s.color
            ));
        }

        let lx = PAD_L + 10.0 + i as f64 * 240.0;
        legend.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"8\" width=\"18\" height=\"4\" fill=\"{}\"/>\n\
             <text x=\"{:.1}\" y=\"14\" fill=\"{}\" font-size=\"10\">{} (test {})</text>\n",
            lx, s.color, lx + 22.0, DARK_TEXT, escape(s.name), percent(s.archive.test_accuracy)
        ));
    }

    format!(
        "<svg class=\"acc-svg\" width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n\
         {}\n{}\n\
         {}\
         <!-- Legend -->\n\
         {}\
         </svg>",
        W, H, y_labels, x_labels, curves, legend
    )
}

/// Full HTML page around the chart.
pub fn page(title: &str, svg: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{0}</title></head>\n\
         <body style=\"font-family: sans-serif\">\n<h2>{0}</h2>\n{1}\n</body></html>\n",
        escape(title),
        svg
    )
}

// Non-finite points break the path into separate segments.
fn polyline<I, F>(points: I, px: &F) -> String
where
    I: Iterator<Item = (f64, f64)>,
    F: Fn(f64, f64) -> (f64, f64),
{
    let mut path = String::new();
    let mut pen_down = false;
    for (step, acc) in points {
        if !acc.is_finite() {
            pen_down = false;
            continue;
        }
        let (x, y) = px(step, acc);
        let cmd = if pen_down { 'L' } else { 'M' };
        if !path.is_empty() {
            path.push(' ');
        }
        path.push_str(&format!("{}{:.1},{:.1}", cmd, x, y));
        pen_down = true;
    }
    path
}

fn percent(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}%", value * 100.0)
    } else {
        "n/a".into()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(steps: Vec<u64>, val_accuracy: Vec<f64>, test_accuracy: f64) -> LogArchive {
        LogArchive {
            loss: vec![0.0; steps.len()],
            steps,
            val_accuracy,
            test_accuracy,
            val_accuracy_on_train: Vec::new(),
        }
    }

    #[test]
    fn both_runs_get_a_curve_and_a_dotted_test_line() {
        let ours = archive(vec![0, 100, 200], vec![0.1, 0.5, 0.9], 0.92);
        let reference = archive(vec![0, 100, 200], vec![0.2, 0.6, 0.8], 0.85);
        let svg = build_svg_accuracy_chart(&[
            Series { name: "ours", color: "#dc2626", archive: &ours },
            Series { name: "reference", color: "#1e40af", archive: &reference },
        ]);
        assert_eq!(svg.matches("<path ").count(), 2);
        assert_eq!(svg.matches("stroke-dasharray=\"2,3\"").count(), 2);
        assert!(svg.contains("ours (test 92.00%)"));
        assert!(svg.contains("reference (test 85.00%)"));
    }

    #[test]
    fn full_accuracy_at_last_step_hits_the_top_right_corner() {
        let run = archive(vec![0, 50], vec![0.0, 1.0], f64::NAN);
        let svg = build_svg_accuracy_chart(&[Series { name: "r", color: "red", archive: &run }]);
        assert!(svg.contains(&format!("M{:.1},{:.1} L{:.1},{:.1}", PAD_L, H - PAD_B, W - PAD_R, PAD_T)));
        assert!(svg.contains("(test n/a)"));
    }

    #[test]
    fn nan_points_split_the_curve() {
        let run = archive(vec![0, 1, 2], vec![0.5, f64::NAN, 0.5], 0.5);
        let svg = build_svg_accuracy_chart(&[Series { name: "r", color: "red", archive: &run }]);
        assert_eq!(svg.matches(" M").count() + svg.matches("\"M").count(), 2);
    }

    #[test]
    fn page_escapes_the_title() {
        assert!(page("a<b", "<svg/>").contains("<title>a&lt;b</title>"));
    }
}
