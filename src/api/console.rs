//! Terminal Console - line-oriented front end for the session
//!
//! Reads one command per line, runs it to completion, prints its status.

use std::io::{self, BufRead, Write};

use super::commands::{dispatch, CommandOutput, SessionCommand, SessionStatus};
use crate::logic::model::Classifier;
use crate::logic::dataset::PredictionRecord;
use crate::logic::session::{AggregateResult, InteractiveSession, SessionPhase, Verdict};

/// Widest bar in the aggregate chart
const CHART_WIDTH: usize = 40;

const HELP: &str = "\
Commands:
  load    (l)        draw a random holdout sample
  predict (p)        classify the loaded sample and update the score
  reset   (r)        zero the score and clear the screen state
  wild    (a)        run the model over the whole holdout set
  status  (s)        show sample, last verdict, score and chart
  help    (h, ?)     show this list
  quit    (q, exit)  leave the session";

/// Text bar chart of predicted-class counts
pub fn render_chart(result: &AggregateResult) -> String {
    let mut out = format!(
        "Prediction Count (Score: {} / {}, accuracy {:.1}%)",
        result.correct,
        result.total,
        result.accuracy() * 100.0
    );

    let max = result.max_count();
    for (label, &count) in &result.per_class_counts {
        let len = if max == 0 {
            0
        } else {
            (count as usize * CHART_WIDTH).div_ceil(max as usize)
        };
        out.push_str(&format!("\n  {} | {:<width$} {}", label, "#".repeat(len), count, width = CHART_WIDTH));
    }
    out
}

fn render_sample(sample: &PredictionRecord) -> String {
    format!(
        "RAM: {} MB\nSwap: {} MB\nCPU: {}%",
        sample.features.ram_usage_mb, sample.features.swap_usage_mb, sample.features.cpu_usage
    )
}

fn render_verdict(verdict: &Verdict) -> String {
    let head = if verdict.correct { "Correct!" } else { "Incorrect." };
    format!(
        "{} Predicted: {} | True: {}\n{}",
        head, verdict.predicted, verdict.truth, verdict.score
    )
}

fn render_status(status: &SessionStatus) -> String {
    let phase = match status.phase {
        SessionPhase::Idle => "idle",
        SessionPhase::SampleLoaded => "sample loaded",
        SessionPhase::Predicted => "predicted",
    };
    let mut out = format!("State: {}\n{}", phase, status.score);
    if let Some(sample) = &status.sample {
        out.push('\n');
        out.push_str(&render_sample(sample));
    }
    if let Some(verdict) = &status.verdict {
        out.push('\n');
        out.push_str(&render_verdict(verdict));
    }
    if let Some(chart) = &status.chart {
        out.push('\n');
        out.push_str(&render_chart(chart));
    }
    out
}

/// Render one command output as status text
pub fn render(output: &CommandOutput) -> String {
    match output {
        CommandOutput::SampleLoaded(sample) => render_sample(sample),
        CommandOutput::Scored(verdict) => render_verdict(verdict),
        CommandOutput::NoSample => "No sample loaded. Use 'load' first.".to_string(),
        CommandOutput::ScoreReset(score) => score.to_string(),
        CommandOutput::Aggregate(result) => render_chart(result),
        CommandOutput::Status(status) => render_status(status),
        CommandOutput::Help => HELP.to_string(),
        CommandOutput::Quit => "Bye.".to_string(),
    }
}

/// Drive the session until `quit` or end of input
pub fn run_console<M, R, W>(
    session: &mut InteractiveSession<'_, M>,
    input: R,
    mut output: W,
) -> io::Result<()>
where
    M: Classifier + ?Sized,
    R: BufRead,
    W: Write,
{
    writeln!(
        output,
        "Memory Classifier Terminal ({} holdout samples). Type 'help' for commands.",
        session.holdout_len()
    )?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<SessionCommand>() {
            Ok(command) => {
                let result = dispatch(session, command);
                writeln!(output, "{}", render(&result))?;
                if result == CommandOutput::Quit {
                    break;
                }
            }
            Err(e) => writeln!(output, "{}", e)?,
        }
        output.flush()?;
    }

    log::info!("Session ended at {}", session.score());
    Ok(())
}
