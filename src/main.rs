use chrono::{DateTime, Utc};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use polling_core::db::connection::{init_db, DbConfig};
use polling_core::{AppError, AppResult, AppState, NewPolling, PollOption, RelatedUserInfo};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match DbConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let database = match init_db(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let state = match AppState::mongo(&database).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to prepare collections: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_scenario(&state).await {
        error!(code = e.code(), "Smoke run failed: {}", e);
        std::process::exit(1);
    }
}

/// Walks one polling through its whole lifecycle against the configured database.
async fn run_scenario(state: &AppState) -> AppResult<()> {
    let users = &state.users;
    let polls = &state.polls;

    users.add_user("124").await?;
    users.add_user("123").await?;
    users.add_created_pollings_to_user(&strings(&["4", "5", "6"]), "123").await?;
    users.delete_created_pollings_to_user(&strings(&["6", "5"]), "123").await?;
    users.add_shared_pollings_to_user(&strings(&["1", "2", "3"]), "124").await?;
    users.delete_shared_pollings_to_user(&strings(&["3", "2"]), "124").await?;

    let date1 = at("2019-11-02T16:00:00Z")?;
    let date2 = at("2019-11-03T16:00:00Z")?;
    let date3 = at("2019-11-04T16:00:00Z")?;

    let poll_id = polls
        .start_polling(
            "123",
            NewPolling {
                subject: "which restaurant to go for dinner?".to_string(),
                polling_end_time: date1,
                place_mode: true,
                multichoice: true,
                options: vec![option("Poke Me", &["124"])],
                related_users_info: Vec::new(),
            },
        )
        .await?;

    polls
        .add_options(
            &poll_id,
            &[option("Panda Express", &["123"]), option("Wendy's", &["123", "124", "125"])],
        )
        .await?;
    polls
        .update_options(&poll_id, &strings(&["Wendy's"]), &strings(&["Chick-fil-A"]))
        .await?;
    polls.delete_options(&poll_id, &strings(&["Panda Express"])).await?;
    polls.vote_options("126", &poll_id, &strings(&["Poke Me"])).await?;

    let address = "3701 ParkView Ln, Apt 17C, Irvine, CA 92612";
    polls
        .add_users_info(
            &poll_id,
            &[
                user_info("123", date1, date2, address),
                user_info("124", date1, date2, address),
            ],
        )
        .await?;
    polls.share_polling(&poll_id, &strings(&["124"])).await?;
    polls.delete_users_info(&poll_id, &strings(&["124"])).await?;
    polls
        .change_available_times(&poll_id, &strings(&["123"]), &[date1], &[date3])
        .await?;
    polls
        .change_start_points(&poll_id, &strings(&["123"]), &strings(&["UCI"]))
        .await?;

    let poll = polls.get_polling(&poll_id).await?;
    info!(polling = %serde_json::to_string(&poll)?, "final polling");

    polls.delete_polling("123", &poll_id).await?;
    info!(%poll_id, "smoke run complete");
    Ok(())
}

fn at(timestamp: &str) -> AppResult<DateTime<Utc>> {
    timestamp
        .parse::<DateTime<Utc>>()
        .map_err(|e| AppError::ValidationError(format!("bad timestamp {}: {}", timestamp, e)))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn option(content: &str, voters: &[&str]) -> PollOption {
    let mut option = PollOption::new(content, "123");
    option.voted_user = strings(voters);
    option
}

fn user_info(
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    start_point: &str,
) -> RelatedUserInfo {
    RelatedUserInfo {
        user_id: user_id.to_string(),
        available_time_from: from,
        available_time_to: to,
        start_point: start_point.to_string(),
    }
}
