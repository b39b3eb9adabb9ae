use crate::debug::{format_f64, format_opt_f64};
use crate::metric::{Element, Metric};
use crate::registry::KnownNetwork;
use crate::session::Session;
use crate::sweep::{LevelRecord, SweepOutcome};
use std::io::{self, Write};

const RULE_WIDTH: usize = 72;

/// Writes the per-level summary and collapse record of one sweep.
pub fn write_report<W: Write>(
    w: &mut W,
    known: &KnownNetwork,
    session: &Session,
    outcome: &SweepOutcome,
) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(w, "{}", rule)?;
    writeln!(
        w,
        "{} ({}): {} buses, {} branches",
        known.description,
        known.name,
        session.case().nb(),
        session.case().nl()
    )?;
    writeln!(w, "{}", rule)?;
    writeln!(
        w,
        "{:>10} {:>4} {:>10} {:>14} {:>17} {:>14} {:>10}  {}",
        "lambda", "conv", "L_max", "inj_margin_min", "single_branch_min", "path_accum_min", "sigma_min", "critical"
    )?;
    for level in outcome.levels.iter() {
        writeln!(w, "{}", format_level(level))?;
    }

    match outcome.collapse {
        None => writeln!(w, "no collapse up to load multiplier {}", last_multiplier(outcome))?,
        Some(c) => {
            let last = format_opt_f64(c.last_converged);
            write!(
                w,
                "collapse: last converged {}, first failed {}",
                last,
                format_f64(c.first_failed)
            )?;
            if let Some((lo, hi)) = c.refined {
                write!(w, " (refined to [{}, {}])", format_f64(lo), format_f64(hi))?;
            }
            writeln!(w)?;
        }
    }
    writeln!(
        w,
        "known maximum load multiplier {}",
        format_f64(known.max_load_multiplier)
    )
}

pub fn print_report(known: &KnownNetwork, session: &Session, outcome: &SweepOutcome) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_report(&mut lock, known, session, outcome)
}

fn format_level(level: &LevelRecord) -> String {
    let value = |m: Metric| format_opt_f64(level.critical.get(&m).map(|c| c.0));
    let critical: Vec<String> = Metric::ALL
        .iter()
        .filter_map(|m| level.critical.get(m).map(|c| format_element(c.1)))
        .collect();
    format!(
        "{:>10} {:>4} {:>10} {:>14} {:>17} {:>14} {:>10}  {}",
        format_f64(level.load_multiplier),
        "yes",
        value(Metric::LIndex),
        value(Metric::InjectionMargin),
        value(Metric::SingleBranch),
        value(Metric::PathAccumulated),
        format_opt_f64(level.min_singular_value),
        critical.join(" ")
    )
}

fn format_element(e: Element) -> String {
    match e {
        Element::Bus(id) => format!("b{}", id),
        Element::Branch(id) => format!("l{}", id),
    }
}

fn last_multiplier(outcome: &SweepOutcome) -> String {
    format_opt_f64(outcome.levels.last().map(|l| l.load_multiplier))
}
