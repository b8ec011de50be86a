//! Spinner output fed from the engine's progress events

use std::io::IsTerminal;
use std::sync::Arc;

use converge_core::{ProgressCallback, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner on stderr, hidden when stderr is not a terminal
pub fn spinner(enabled: bool) -> ProgressBar {
    if !enabled || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

/// Progress callback that updates the spinner
pub fn callback(pb: ProgressBar) -> ProgressCallback {
    Arc::new(move |event: ProgressEvent| match &event {
        ProgressEvent::Attempt { attempt, .. } => {
            pb.set_message(format!("Attempt {}", attempt));
        }
        ProgressEvent::Retrying { status, delay, .. } => {
            pb.set_message(format!("{} - retrying in {:?}", status, delay));
        }
        ProgressEvent::Polling {
            resource_id,
            status,
            ..
        } => {
            pb.set_message(format!("{}: {}", resource_id, format_state(status)));
        }
        ProgressEvent::Converged {
            resource_id: None, ..
        } => {
            pb.set_message("Request accepted");
        }
        ProgressEvent::Converged {
            resource_id: Some(id),
            ..
        } => {
            pb.finish_with_message(format!("{}: {}", id, format_state("converged")));
        }
        ProgressEvent::Failed { error, .. } => {
            pb.abandon_with_message(format!("\u{2717} {}", error));
        }
    })
}

/// Format an observed state for display with status icons
fn format_state(state: &str) -> String {
    match state.to_lowercase().as_str() {
        "converged" | "available" | "active" | "ready" | "completed" | "deleted" => {
            format!("\u{2713} {}", state) // checkmark
        }
        "failed" | "error" => format!("\u{2717} {}", state), // x mark
        _ => format!("\u{21bb} {}", state),                  // arrow circle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_state_icons() {
        assert!(format_state("available").starts_with('\u{2713}'));
        assert!(format_state("ERROR").starts_with('\u{2717}'));
        assert!(format_state("pending").starts_with('\u{21bb}'));
    }

    #[test]
    fn test_hidden_spinner_accepts_events() {
        let pb = spinner(false);
        let cb = callback(pb.clone());
        cb(ProgressEvent::Attempt {
            attempt: 1,
            elapsed: std::time::Duration::ZERO,
        });
        cb(ProgressEvent::Failed {
            resource_id: None,
            error: "boom".to_string(),
        });
        assert!(pb.is_hidden());
    }
}
