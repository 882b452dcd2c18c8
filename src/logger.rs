//! Console progress log for forest growth.
use colored::Colorize;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::control::GrowthControl;
use crate::dataset::Dataset;
use crate::metrics::ConfusionMatrix;


const WIDTH: usize = 8;
const PREC_WIDTH: usize = 5;
const FULL_WIDTH: usize = 60;
const STAT_WIDTH: usize = (FULL_WIDTH - 4) / 2;


/// Prints the growth parameters, a line every `print_every` trees,
/// and a summary once every tree is grown.
///
/// Trees finish in any order when grown in parallel,
/// so the progress lines count finished trees.
pub(crate) struct GrowthLogger {
    n_trees: usize,
    print_every: usize,
    finished: AtomicUsize,
    start: Instant,
}


impl GrowthLogger {
    /// Create a logger and start the clock.
    pub(crate) fn new(control: &GrowthControl) -> Self {
        Self {
            n_trees: control.n_trees,
            print_every: control.print_every,
            finished: AtomicUsize::new(0),
            start: Instant::now(),
        }
    }


    /// print current settings.
    pub(crate) fn print_stats(
        &self,
        dataset: &Dataset,
        control: &GrowthControl,
        seed: u64,
        n_candidate: usize,
    )
    {
        let (n_sample, n_feature) = dataset.shape();
        let mtry = if control.mtry == usize::MAX {
            "All".to_string()
        } else {
            control.mtry.to_string()
        };
        let max_depth = if control.max_depth == usize::MAX {
            "Nothing".to_string()
        } else {
            control.max_depth.to_string()
        };
        let sampling = match (control.replacement, control.stratified) {
            (true, true) => "Stratified, replacement",
            (true, false) => "Replacement",
            (false, true) => "Stratified, no replacement",
            (false, false) => "No replacement",
        };

        let header = format!(
            "{:=>FULL_WIDTH$}\n{:^FULL_WIDTH$}\n{:->FULL_WIDTH$}",
            "", "STATS".bold(), "",
        );
        println!(
            "\n{header}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            + {:<STAT_WIDTH$}\t{:>STAT_WIDTH$}\n\
            {:=^FULL_WIDTH$}\n\
            ",
            "Observations".bold(),
            n_sample.to_string().bold().green(),
            "Features (candidates)".bold(),
            format!("{n_feature} ({n_candidate})").bold().green(),
            "Classes".bold(),
            dataset.classes().join(", ").bold().green(),
            "Trees".bold(),
            self.n_trees.to_string().bold().green(),
            "Mtry".bold(),
            mtry.bold().yellow(),
            "Max depth".bold(),
            max_depth.bold().yellow(),
            "Sampling".bold(),
            sampling.bold().yellow(),
            "Seed".bold(),
            seed.to_string().bold().cyan(),
            "".bold(),
        );
    }


    /// Count a finished tree and print a line every `print_every` trees.
    pub(crate) fn tree_finished(&self) {
        let done = self.finished.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.print_every != 0 { return; }

        let time = self.start.elapsed().as_millis();
        println!(
            "{} {}\t{}",
            "[LOG]".bold().magenta(),
            format!("{:>WIDTH$} / {:<WIDTH$}", done, self.n_trees).red(),
            time_format(time).bold().cyan(),
        );
    }


    /// Print the summary of a completed growth.
    pub(crate) fn finish(&self, oob: Option<&ConfusionMatrix>) {
        let time = self.start.elapsed().as_millis();
        println!(
            "{} {}\t{}",
            "[FIN]".bold().bright_green(),
            format!("{:>WIDTH$} / {:<WIDTH$}", self.n_trees, self.n_trees).red(),
            time_format(time).bold().cyan(),
        );

        let matrix = match oob {
            Some(matrix) => matrix,
            None => return,
        };
        let fmt = |v: Option<f64>| match v {
            Some(v) => format!("{v:>WIDTH$.PREC_WIDTH$}"),
            None => format!("{:>WIDTH$}", "-"),
        };
        println!(
            "{} ERROR {}\tG-MEAN {}\tMCC {}\n",
            "[OOB]".bold().blue(),
            fmt(matrix.error_rate().ok()).bold().green(),
            fmt(matrix.g_mean().ok()).bold().yellow(),
            fmt(matrix.mcc().ok()).bold().yellow(),
        );
    }
}


/// Formats milliseconds as `  0.123s`, ` 01.234s`, ` 01m 02s`, or ` 01h 02m`.
pub(crate) fn time_format(millisec: u128) -> String {
    if millisec < 1_000 {
        return format!("  0.{:0>3}s", millisec);
    }
    let sec = millisec / 1_000;
    let millisec = millisec % 1_000;
    if sec < 60 {
        return format!(" {:0>2}.{:0>3}s", sec, millisec);
    }
    let min = sec / 60;
    let sec = sec % 60;
    if min < 60 {
        return format!(" {:0>2}m {:0>2}s", min, sec);
    }
    let hours = min / 60;
    let min = min % 60;
    format!(" {:0>2}h {:0>2}m", hours, min)
}
