use std::io::{self, BufRead, Write};

use clap::Args;
use tracing::warn;

use crate::context::AppContext;
use crate::domain::ticket::Destination;
use crate::error::AppResult;
use crate::workflow::clickup::{ClickUpCreateOptions, clickup_destinations, create_clickup_tests};
use crate::workflow::outcome::RunOutcome;

/// Most choices a select control can show.
pub const MAX_CHOICES: usize = 25;

#[derive(Args, Debug, Clone)]
pub struct ClickUpArgs {
    /// Source task id.
    pub task_id: String,
    /// Destination list; prompts for one when omitted.
    #[arg(short, long)]
    pub list: Option<String>,
    /// Upper bound on generated tests (defaults to MAX_TESTS).
    #[arg(long)]
    pub max_tests: Option<usize>,
}

pub async fn run(ctx: &AppContext, args: ClickUpArgs) -> AppResult<RunOutcome> {
    let list_id = match args.list {
        Some(list) => Some(list),
        None => prompt_destination(ctx).await?,
    };

    let options = ClickUpCreateOptions {
        task_id: args.task_id.trim().to_string(),
        list_id,
        max_tests: args.max_tests.unwrap_or(ctx.config.max_tests),
    };
    Ok(create_clickup_tests(ctx, options).await)
}

/// Offers the discovered destinations; falls back to the configured list
/// when discovery yields nothing.
async fn prompt_destination(ctx: &AppContext) -> AppResult<Option<String>> {
    let destinations = match clickup_destinations(ctx).await {
        Ok(destinations) => destinations,
        Err(err) => {
            warn!(error = %err, "destination discovery failed");
            Vec::new()
        }
    };
    if destinations.is_empty() {
        return Ok(None);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();
    pick_destination(&destinations, &mut input, &mut stdout)
}

pub fn pick_destination<R, W>(
    destinations: &[Destination],
    input: &mut R,
    output: &mut W,
) -> AppResult<Option<String>>
where
    R: BufRead,
    W: Write,
{
    let choices = &destinations[..destinations.len().min(MAX_CHOICES)];
    writeln!(output, "Select a destination list:")?;
    for (number, destination) in choices.iter().enumerate() {
        writeln!(
            output,
            "{:>3}) {} ({})",
            number + 1,
            destination.label,
            destination.description
        )?;
    }

    loop {
        write!(output, "Number (Enter to use the default list): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.parse::<usize>() {
            Ok(number) if (1..=choices.len()).contains(&number) => {
                return Ok(Some(choices[number - 1].value.clone()));
            }
            _ => writeln!(output, "Pick a number between 1 and {}.", choices.len())?,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn destinations(count: usize) -> Vec<Destination> {
        (1..=count)
            .map(|i| Destination {
                label: format!("QA - List {i}"),
                value: format!("list-{i}"),
                description: "Folder: Testing Repository".to_string(),
            })
            .collect()
    }

    #[test]
    fn returns_the_chosen_list() {
        let mut input = Cursor::new("2\n");
        let mut output = Vec::new();
        let choice = pick_destination(&destinations(3), &mut input, &mut output).unwrap();
        assert_eq!(choice.as_deref(), Some("list-2"));
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("  1) QA - List 1 (Folder: Testing Repository)"));
    }

    #[test]
    fn reprompts_on_out_of_range_input() {
        let mut input = Cursor::new("9\nabc\n1\n");
        let mut output = Vec::new();
        let choice = pick_destination(&destinations(3), &mut input, &mut output).unwrap();
        assert_eq!(choice.as_deref(), Some("list-1"));
        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches("Pick a number between 1 and 3.").count(), 2);
    }

    #[test]
    fn caps_the_number_of_choices() {
        let mut input = Cursor::new("26\n25\n");
        let mut output = Vec::new();
        let choice = pick_destination(&destinations(40), &mut input, &mut output).unwrap();
        assert_eq!(choice.as_deref(), Some("list-25"));
        let shown = String::from_utf8(output).unwrap();
        assert!(!shown.contains("List 26"));
    }

    #[test]
    fn blank_input_keeps_the_default() {
        let mut input = Cursor::new("\n");
        let mut output = Vec::new();
        assert_eq!(
            pick_destination(&destinations(2), &mut input, &mut output).unwrap(),
            None
        );
    }
}
