use crate::context::AppContext;
use crate::domain::ticket::Destination;
use crate::error::AppResult;
use crate::workflow::clickup::clickup_destinations;

pub async fn run(ctx: &AppContext) -> AppResult<Vec<Destination>> {
    clickup_destinations(ctx).await
}

pub fn render(destinations: &[Destination]) -> Vec<String> {
    if destinations.is_empty() {
        return vec!["No destinations found; check CLICKUP_SPACES.".to_string()];
    }
    destinations
        .iter()
        .map(|d| format!("{} [{}] {}", d.label, d.value, d.description))
        .collect()
}
