//! SVG charts for the report pages.
//!
//! Every function returns a complete standalone SVG document. Layout is fixed-size
//! and deliberately plain: titles, axes, bars or lines, and value annotations.

use std::fmt::{self, Write};

/// Green to red, for series ordered from "good" to "bad" (e.g. young to old).
const GREEN_TO_RED: [&str; 11] = [
    "#006837", "#1a9850", "#66bd63", "#a6d96a", "#d9ef8b", "#ffffbf", "#fee08b", "#fdae61",
    "#f46d43", "#d73027", "#a50026",
];

pub const DENIM_BLUE: &str = "#3b5b92";
pub const MEDIUM_GREEN: &str = "#39ad48";
pub const RED_ORANGE: &str = "#ff3c06";
pub const HIGHLIGHT_RED: &str = "#e74c3c";
pub const ADDITIONS_GREEN: &str = "#2ecc71";

const FONT: &str = "font-family=\"sans-serif\"";
const MARGIN: f64 = 60.0;

/// A named series of values, one per x position.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// `n` colors spread evenly over the green-to-red scale.
pub fn green_to_red(n: usize) -> Vec<&'static str> {
    match n {
        0 => Vec::new(),
        1 => vec![GREEN_TO_RED[1]],
        _ => (0..n)
            .map(|i| GREEN_TO_RED[i * (GREEN_TO_RED.len() - 1) / (n - 1)])
            .collect(),
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percentage with one decimal, e.g. `12.5%`.
pub fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

struct Canvas {
    width: f64,
    height: f64,
    body: String,
}

impl Canvas {
    fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str) -> fmt::Result {
        writeln!(
            self.body,
            "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{fill}\"/>",
            w.max(0.0),
            h.max(0.0)
        )
    }

    fn text(&mut self, x: f64, y: f64, size: u32, fill: &str, anchor: &str, content: &str) -> fmt::Result {
        writeln!(
            self.body,
            "<text x=\"{x:.1}\" y=\"{y:.1}\" {FONT} font-size=\"{size}\" fill=\"{fill}\" text-anchor=\"{anchor}\" dominant-baseline=\"middle\">{}</text>",
            escape(content)
        )
    }

    fn rotated_text(&mut self, x: f64, y: f64, size: u32, angle: i32, content: &str) -> fmt::Result {
        writeln!(
            self.body,
            "<text x=\"{x:.1}\" y=\"{y:.1}\" {FONT} font-size=\"{size}\" text-anchor=\"end\" transform=\"rotate({angle} {x:.1} {y:.1})\">{}</text>",
            escape(content)
        )
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) -> fmt::Result {
        writeln!(
            self.body,
            "<line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\" stroke=\"{stroke}\" stroke-width=\"{width}\"/>"
        )
    }

    fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, width: f64) -> fmt::Result {
        writeln!(
            self.body,
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{width}\"/>",
            format_points(points)
        )
    }

    fn polygon(&mut self, points: &[(f64, f64)], fill: &str) -> fmt::Result {
        writeln!(
            self.body,
            "<polygon points=\"{}\" fill=\"{fill}\" stroke=\"none\"/>",
            format_points(points)
        )
    }

    fn title(&mut self, title: &str) -> fmt::Result {
        let x = self.width / 2.0;
        self.text(x, 20.0, 16, "black", "middle", title)
    }

    /// Single row legend across the top of the chart.
    fn legend(&mut self, entries: &[(&str, &str)]) -> fmt::Result {
        if entries.is_empty() {
            return Ok(());
        }
        let slot = (self.width - 2.0 * MARGIN) / entries.len() as f64;
        for (i, (name, color)) in entries.iter().enumerate() {
            let x = MARGIN + slot * i as f64;
            self.rect(x, 36.0, 12.0, 12.0, color)?;
            self.text(x + 16.0, 42.0, 11, "black", "start", name)?;
        }
        Ok(())
    }

    fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n{}</svg>\n",
            self.body,
            w = self.width,
            h = self.height
        )
    }
}

fn format_points(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{x:.1},{y:.1}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn text_color_for(fill: &str) -> &'static str {
    // Light fills in the middle of the scale need dark text.
    match fill {
        "#a6d96a" | "#d9ef8b" | "#ffffbf" | "#fee08b" | "#fdae61" => "black",
        _ => "white",
    }
}

/// One horizontal bar split into proportional segments, labelled with
/// `label(value, share)`.
pub fn horizontal_stacked_bar<F>(
    title: &str,
    segments: &[(String, f64)],
    colors: &[&str],
    label: F,
) -> Result<String, fmt::Error>
where
    F: Fn(f64, f64) -> String,
{
    let mut canvas = Canvas::new(800.0, 180.0);
    canvas.title(title)?;
    let legend: Vec<(&str, &str)> = segments
        .iter()
        .zip(colors.iter().cycle())
        .map(|((name, _), color)| (name.as_str(), *color))
        .collect();
    canvas.legend(&legend)?;

    let total: f64 = segments.iter().map(|(_, value)| value).sum();
    let width = canvas.width - 2.0 * MARGIN;
    let (top, height) = (70.0, 70.0);
    let mut x = MARGIN;
    for ((_, value), color) in segments.iter().zip(colors.iter().cycle()) {
        if total <= 0.0 {
            break;
        }
        let share = value / total;
        let w = width * share;
        canvas.rect(x, top, w, height, color)?;
        if share > 0.05 {
            canvas.text(
                x + w / 2.0,
                top + height / 2.0,
                13,
                text_color_for(color),
                "middle",
                &label(*value, share),
            )?;
        }
        x += w;
    }
    Ok(canvas.finish())
}

/// Vertical bars with the value above each bar. `highlight` colors the first bar.
pub fn bar_chart<F>(
    title: &str,
    bars: &[(String, f64)],
    color: &str,
    highlight: Option<&str>,
    annotate: F,
) -> Result<String, fmt::Error>
where
    F: Fn(f64) -> String,
{
    let slot = 60.0;
    let width = (bars.len() as f64 * slot + 2.0 * MARGIN).max(400.0);
    let mut canvas = Canvas::new(width, 520.0);
    canvas.title(title)?;

    let (top, bottom) = (50.0, 400.0);
    let max = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    canvas.line(MARGIN, bottom, width - MARGIN, bottom, "black", 1.0)?;

    for (i, (name, value)) in bars.iter().enumerate() {
        let x = MARGIN + slot * i as f64 + 8.0;
        let h = if max > 0.0 {
            (bottom - top) * value / max
        } else {
            0.0
        };
        let fill = match highlight {
            Some(highlight) if i == 0 => highlight,
            _ => color,
        };
        canvas.rect(x, bottom - h, slot - 16.0, h, fill)?;
        canvas.text(x + (slot - 16.0) / 2.0, bottom - h - 10.0, 11, "black", "middle", &annotate(*value))?;
        canvas.rotated_text(x + (slot - 16.0) / 2.0, bottom + 14.0, 11, -70, name)?;
    }
    Ok(canvas.finish())
}

/// One column per category, stacked by series. With `normalize` every column
/// fills the full height and segments show shares; raw values are printed inside.
pub fn stacked_columns(
    title: &str,
    categories: &[String],
    series: &[Series],
    colors: &[&str],
    normalize: bool,
) -> Result<String, fmt::Error> {
    let slot = 60.0;
    let width = (categories.len() as f64 * slot + 2.0 * MARGIN).max(400.0);
    let mut canvas = Canvas::new(width, 560.0);
    canvas.title(title)?;
    let legend: Vec<(&str, &str)> = series
        .iter()
        .zip(colors.iter().cycle())
        .map(|(s, color)| (s.name.as_str(), *color))
        .collect();
    canvas.legend(&legend)?;

    let (top, bottom) = (70.0, 440.0);
    let column_total = |i: usize| -> f64 { series.iter().map(|s| s.values.get(i).copied().unwrap_or(0.0)).sum() };
    let max_total = (0..categories.len()).map(column_total).fold(0.0, f64::max);

    for (i, category) in categories.iter().enumerate() {
        let x = MARGIN + slot * i as f64 + 8.0;
        let total = column_total(i);
        let scale = if normalize { total } else { max_total };
        let mut y = bottom;
        for (s, color) in series.iter().zip(colors.iter().cycle()) {
            let value = s.values.get(i).copied().unwrap_or(0.0);
            if scale <= 0.0 || value <= 0.0 {
                continue;
            }
            let h = (bottom - top) * value / scale;
            y -= h;
            canvas.rect(x, y, slot - 16.0, h, color)?;
            if h > 14.0 {
                canvas.text(x + (slot - 16.0) / 2.0, y + h / 2.0, 10, text_color_for(color), "middle", &format!("{value}"))?;
            }
        }
        canvas.rotated_text(x + (slot - 16.0) / 2.0, bottom + 14.0, 11, -70, category)?;
    }
    Ok(canvas.finish())
}

/// Lines over labelled x positions. With `stacked_area` series are drawn as
/// filled areas stacked on top of one another.
pub fn line_chart(
    title: &str,
    x_labels: &[String],
    series: &[Series],
    colors: &[&str],
    stacked_area: bool,
    y_label: &str,
) -> Result<String, fmt::Error> {
    let slot = 70.0;
    let width = (x_labels.len() as f64 * slot + 2.0 * MARGIN).max(500.0);
    let mut canvas = Canvas::new(width, 560.0);
    canvas.title(title)?;
    let legend: Vec<(&str, &str)> = series
        .iter()
        .zip(colors.iter().cycle())
        .map(|(s, color)| (s.name.as_str(), *color))
        .collect();
    canvas.legend(&legend)?;

    let (top, bottom) = (70.0, 440.0);
    let (left, right) = (MARGIN, width - MARGIN);
    canvas.line(left, bottom, right, bottom, "black", 1.0)?;
    canvas.line(left, top, left, bottom, "black", 1.0)?;
    canvas.rotated_text(20.0, (top + bottom) / 2.0, 12, -90, y_label)?;

    let points = x_labels.len();
    let x_at = |i: usize| -> f64 {
        if points <= 1 {
            (left + right) / 2.0
        } else {
            left + (right - left) * i as f64 / (points - 1) as f64
        }
    };

    let mut baseline = vec![0.0; points];
    let tops: Vec<Vec<f64>> = series
        .iter()
        .map(|s| {
            (0..points)
                .map(|i| {
                    let value = s.values.get(i).copied().unwrap_or(0.0);
                    if stacked_area {
                        baseline[i] += value;
                        baseline[i]
                    } else {
                        value
                    }
                })
                .collect()
        })
        .collect();

    let max = tops.iter().flatten().copied().fold(0.0, f64::max);
    let y_at = |value: f64| -> f64 {
        if max > 0.0 {
            bottom - (bottom - top) * value / max
        } else {
            bottom
        }
    };

    for tick in 0..=4 {
        let value = max * tick as f64 / 4.0;
        canvas.text(left - 6.0, y_at(value), 10, "black", "end", &format!("{value:.0}"))?;
    }

    let mut previous = vec![0.0; points];
    for (values, color) in tops.iter().zip(colors.iter().cycle()) {
        let upper: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (x_at(i), y_at(*v)))
            .collect();
        if stacked_area {
            let lower = previous
                .iter()
                .enumerate()
                .rev()
                .map(|(i, v)| (x_at(i), y_at(*v)));
            let outline: Vec<(f64, f64)> = upper.iter().copied().chain(lower).collect();
            canvas.polygon(&outline, color)?;
            previous.clone_from(values);
        } else {
            canvas.polyline(&upper, color, 3.0)?;
        }
    }

    for (i, label) in x_labels.iter().enumerate() {
        canvas.rotated_text(x_at(i), bottom + 14.0, 11, -70, label)?;
    }
    Ok(canvas.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("g-api / <gapi> & \"js\""), "g-api / &lt;gapi&gt; &amp; &quot;js&quot;");
    }

    #[test]
    fn test_green_to_red_spreads_over_scale() {
        assert!(green_to_red(0).is_empty());
        let colors = green_to_red(6);
        assert_eq!(colors.len(), 6);
        assert_eq!(colors[0], GREEN_TO_RED[0]);
        assert_eq!(colors[5], GREEN_TO_RED[10]);
    }

    #[test]
    fn test_horizontal_stacked_bar_labels_segments() {
        let svg = horizontal_stacked_bar(
            "Age",
            &[("< 7 days".to_string(), 3.0), ("> 365 days".to_string(), 1.0)],
            &green_to_red(2),
            |value, _| format!("{value}"),
        )
        .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("&lt; 7 days"));
        assert!(svg.contains(">3<"));
    }

    #[test]
    fn test_bar_chart_handles_all_zero_values() {
        let svg = bar_chart("Empty", &[("core".to_string(), 0.0)], DENIM_BLUE, None, |v| format!("{v}"))
            .unwrap();
        assert!(svg.contains("core"));
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn test_line_chart_draws_one_polyline_per_series() {
        let labels = vec!["2024-01-01".to_string(), "2024-01-08".to_string()];
        let series = vec![
            Series::new("Open", vec![10.0, 12.0]),
            Series::new("Created", vec![3.0, 4.0]),
        ];
        let svg = line_chart("Trend", &labels, &series, &[DENIM_BLUE, MEDIUM_GREEN], false, "Pull Requests")
            .unwrap();
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("2024-01-08"));
    }

    #[test]
    fn test_stacked_area_draws_polygons() {
        let labels = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let series = vec![Series::new("x", vec![1.0, 2.0, 3.0]), Series::new("y", vec![1.0, 1.0, 1.0])];
        let svg = line_chart("Area", &labels, &series, &green_to_red(2), true, "Pull Requests")
            .unwrap();
        assert_eq!(svg.matches("<polygon").count(), 2);
    }

    #[test]
    fn test_stacked_columns_normalized() {
        let svg = stacked_columns(
            "Columns",
            &["core".to_string()],
            &[Series::new("Additions", vec![3.0]), Series::new("Deletions", vec![1.0])],
            &[ADDITIONS_GREEN, HIGHLIGHT_RED],
            true,
        )
        .unwrap();
        assert_eq!(svg.matches(ADDITIONS_GREEN).count(), 2);
        assert!(svg.contains("core"));
    }
}
