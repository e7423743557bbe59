use std::path::Path;

use console::Style;
use hogpyr_core::{FeaturePyramid, HogConfig, ImageData, Real, ResponseSet};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    path: Style,
    dim: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            path: Style::new().underlined(),
            dim: Style::new().dim().yellow(),
        }
    }
}

pub fn print_config_summary(config: &HogConfig, input: &Path, image: &ImageData) {
    let s = Styles::new();
    let (rows, cols, channels) = image.dim();

    println!();
    println!("  {}", s.title.apply_to("HOG Pyramid"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(11)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Image"),
        s.value.apply_to(format!(
            "{cols}x{rows}, {channels} ch, {}",
            image.sample_type()
        ))
    );
    println!();

    println!("  {}", s.header.apply_to("Features"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Scales"),
        s.value.apply_to(config.num_scales)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bin size"),
        s.value.apply_to(format!("{} px", config.bin_size))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Orient."),
        s.value.apply_to(config.num_orientations)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Length"),
        s.value.apply_to(config.feature_length())
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Precision"),
        s.value.apply_to(config.precision)
    );
    println!();
}

pub fn print_pyramid_table<T: Real>(pyramid: &FeaturePyramid<T>) {
    let s = Styles::new();

    println!(
        "  {}",
        s.header.apply_to(format!(
            "{} levels, {} per octave",
            pyramid.len(),
            pyramid.interval()
        ))
    );
    println!("{:>7}  {:>8}  {:>11}  {:>9}", "Level", "Scale", "Image", "Cells");
    println!("{}", "-".repeat(42));
    for level in pyramid.levels() {
        let (rows, cols) = level.image_size;
        let cells = format!("{}x{}", level.features.cols(), level.features.rows());
        println!(
            "{:>7}  {:>8.4}  {:>11}  {:>9}",
            level.index,
            level.scale,
            format!("{cols}x{rows}"),
            cells
        );
    }
}

/// Strongest responses across every level and filter, best first.
pub fn print_peaks<T: Real>(responses: &ResponseSet<T>, top: usize) {
    let s = Styles::new();

    let mut peaks: Vec<_> = responses
        .surfaces()
        .iter()
        .filter_map(|surface| {
            surface
                .peak()
                .map(|(score, at)| (surface.level, surface.filter, surface.scale, score.as_f64(), at))
        })
        .collect();
    peaks.sort_by(|a, b| b.3.total_cmp(&a.3));

    let empty = responses.len() - peaks.len();

    println!(
        "\nTop {} responses (of {} level/filter pairs):",
        top.min(peaks.len()),
        responses.len()
    );
    println!(
        "{:>5}  {:>6}  {:>6}  {:>8}  {:>10}  {:>12}",
        "Rank", "Level", "Filter", "Scale", "Cell", "Score"
    );
    println!("{}", "-".repeat(56));
    for (rank, (level, filter, scale, score, (row, col))) in peaks.iter().take(top).enumerate() {
        println!(
            "{:>5}  {:>6}  {:>6}  {:>8.4}  {:>10}  {:>12.6}",
            rank + 1,
            level,
            filter,
            scale,
            format!("({row}, {col})"),
            score
        );
    }

    if empty > 0 {
        println!(
            "\n{}",
            s.dim.apply_to(format!("{empty} pair(s) too small for their filter"))
        );
    }
}
