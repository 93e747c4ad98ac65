use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// How a failing step is reported.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Severity {
    /// Abort the whole check.
    Fail,
    /// Print the output and carry on.
    Warn,
}

struct Step {
    label: &'static str,
    args: &'static [&'static str],
    severity: Severity,
}

const STEPS: &[Step] = &[
    Step {
        label: "host build (std tests, tracing)",
        args: &["check", "-p", "xfer", "--all-targets", "--features", "tracing"],
        severity: Severity::Fail,
    },
    Step {
        label: "target build (thumbv7em-none-eabihf, no_std)",
        args: &[
            "check",
            "-p",
            "xfer",
            "--target",
            "thumbv7em-none-eabihf",
            "--no-default-features",
        ],
        severity: Severity::Fail,
    },
    Step {
        label: "target build with defmt",
        args: &[
            "check",
            "-p",
            "xfer",
            "--target",
            "thumbv7em-none-eabihf",
            "--features",
            "defmt",
        ],
        severity: Severity::Fail,
    },
    Step {
        label: "clippy lints",
        args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        severity: Severity::Warn,
    },
    Step {
        label: "code formatting",
        args: &["fmt", "--all", "--check"],
        severity: Severity::Warn,
    },
];

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking xfer builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    for step in STEPS {
        println!("{}", format!("  Checking {}...", step.label).cyan());
        let start = Instant::now();

        let output = Command::new("cargo")
            .args(step.args)
            .output()
            .with_context(|| format!("Failed to run cargo for {}", step.label))?;

        if output.status.success() {
            println!(
                "{}",
                format!(
                    "  ✓ {} passed in {:.2}s",
                    step.label,
                    start.elapsed().as_secs_f64()
                )
                .green()
            );
        } else if step.severity == Severity::Warn {
            eprintln!("{}", format!("  ⚠ {} reported issues", step.label).yellow().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        } else {
            eprintln!("{}", format!("  ✗ {} failed", step.label).red().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            anyhow::bail!("{} failed", step.label);
        }
        println!();
    }

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
