use veiltext::{CleanResultVerbose, ScoreBreakdown, SkipReason, SurfaceScan};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        fn wrap(&self, s: &str, code: &str) -> String {
            if self.enabled { format!("{code}{s}{RESET}") } else { s.to_string() }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            self.wrap(s.as_ref(), color)
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            self.wrap(s.as_ref(), BOLD)
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            self.wrap(s.as_ref(), DIM)
        }
    }
}

pub fn print_run(run: &CleanResultVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    let details = &run.details;

    let source = details.preset.as_deref().map_or_else(|| "explicit rule list".to_string(), |p| format!("preset {p}"));
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Cleaning with {source}"), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Cleaned text ━━━", ansi::GRAY));
    for line in run.result.plain_text.lines() {
        println!("  {line}");
    }

    println!("\n{}", palette.paint("━━━ Surface patterns ━━━", ansi::GRAY));
    print_scan("before", &details.surface_before, &palette);
    print_scan("after ", &details.surface_after, &palette);

    println!("\n{}", palette.paint("━━━ Rules ━━━", ansi::GRAY));
    if details.metrics.rules.is_empty() && details.metrics.skipped.is_empty() {
        println!("{}", palette.dim("  No rules selected"));
    }
    for outcome in &details.metrics.rules {
        let count = if outcome.replacements > 0 {
            palette.paint(format!("✓ {} replaced", outcome.replacements), ansi::GREEN)
        } else {
            palette.dim("✗ no match")
        };
        println!(
            "  {} {}  {}",
            palette.paint(&outcome.rule_id, ansi::BLUE),
            count,
            palette.dim(format!("({} leaves)", outcome.leaves_touched))
        );
    }
    for skip in &details.metrics.skipped {
        let reason = match &skip.reason {
            SkipReason::Unknown => "unknown id".to_string(),
            SkipReason::Disabled => "disabled".to_string(),
            SkipReason::Malformed(msg) => format!("malformed pattern: {msg}"),
        };
        println!("  {} {}", palette.paint(&skip.rule_id, ansi::YELLOW), palette.dim(format!("skipped, {reason}")));
    }

    println!("\n{}", palette.paint("━━━ Score ━━━", ansi::GRAY));
    println!(
        "  Human-likeness: {} → {}",
        palette.paint(run.result.score_before.to_string(), ansi::YELLOW),
        palette.bold(palette.paint(run.result.score_after.to_string(), ansi::GREEN)),
    );
    if let Some(b) = &details.breakdown_after {
        print_breakdown(b, &palette);
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Transform: {}  │  Leaves: {}/{} changed",
        palette.paint(format!("{:?}", run.result.elapsed), ansi::GREEN),
        palette.paint(format!("{:?}", details.metrics.total), ansi::CYAN),
        details.metrics.leaves_changed,
        details.metrics.leaves_visited,
    );
    println!();
}

fn print_scan(label: &str, scan: &SurfaceScan, palette: &ansi::Palette) {
    if scan.is_clean() {
        println!("  {} {}", palette.dim(label), palette.paint("clean", ansi::GREEN));
        return;
    }
    let families: Vec<String> = scan.families().map(|(name, n)| format!("{name} ×{n}")).collect();
    println!("  {} {}", palette.dim(label), palette.paint(families.join(", "), ansi::RED));
}

fn print_breakdown(b: &ScoreBreakdown, palette: &ansi::Palette) {
    println!(
        "  {} {}  {} {}  {} {:.2}",
        palette.dim("words:"),
        b.word_count,
        palette.dim("sentences:"),
        b.sentence_count,
        palette.dim("diversity:"),
        b.lexical_diversity,
    );
    println!(
        "  {} +{:.1}  {} +{:.1}  {} +{:.1}  {} -{:.1}",
        palette.dim("length"),
        b.length_factor,
        palette.dim("diversity"),
        b.diversity_factor,
        palette.dim("sentence"),
        b.sentence_factor,
        palette.dim("special"),
        b.special_char_factor,
    );
}
