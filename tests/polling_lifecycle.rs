use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};

use polling_core::{AppError, AppState, NewPolling, PollId, PollOption, RelatedUserInfo};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 11, d, 16, 0, 0).unwrap()
}

fn option(content: &str, voters: &[&str]) -> PollOption {
    let mut option = PollOption::new(content, "123");
    option.voted_user = strings(voters);
    option
}

fn info(user_id: &str) -> RelatedUserInfo {
    RelatedUserInfo {
        user_id: user_id.to_string(),
        available_time_from: day(2),
        available_time_to: day(3),
        start_point: "3701 ParkView Ln, Apt 17C, Irvine, CA 92612".to_string(),
    }
}

fn dinner() -> NewPolling {
    NewPolling {
        subject: "which restaurant to go for dinner?".to_string(),
        polling_end_time: day(2),
        place_mode: true,
        multichoice: true,
        options: vec![option("Poke Me", &["124"])],
        related_users_info: Vec::new(),
    }
}

#[fixture]
fn state() -> AppState {
    AppState::in_memory()
}

async fn started(state: &AppState) -> PollId {
    state.polls.start_polling("123", dinner()).await.unwrap()
}

#[rstest]
#[tokio::test]
async fn created_polling_matches_submission(state: AppState) {
    let poll_id = started(&state).await;

    let poll = state.polls.get_polling(&poll_id).await.unwrap();

    assert_eq!(poll.id, poll_id);
    assert_eq!(poll.creator, "123");
    assert_eq!(poll.subject, "which restaurant to go for dinner?");
    assert_eq!(poll.options, vec![option("Poke Me", &["124"])]);
    assert!(poll.place_mode && poll.multichoice);
}

#[rstest]
#[tokio::test]
async fn creator_references_new_polling(state: AppState) {
    let poll_id = started(&state).await;

    let creator = state.users.get_user("123").await.unwrap();

    assert_eq!(creator.created_pollings, vec![poll_id.to_hex()]);
    assert!(creator.shared_pollings.is_empty());
    let listed = state.polls.list_created_pollings("123").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, poll_id);
}

#[rstest]
#[tokio::test]
async fn adding_the_same_option_twice_keeps_one(state: AppState) {
    let poll_id = started(&state).await;
    let extra = [option("Panda Express", &["123"])];

    let first = state.polls.add_options(&poll_id, &extra).await.unwrap();
    let second = state.polls.add_options(&poll_id, &extra).await.unwrap();

    assert_eq!(first.applied, strings(&["Panda Express"]));
    assert_eq!(second.skipped, strings(&["Panda Express"]));
    let poll = state.polls.get_polling(&poll_id).await.unwrap();
    let count = poll.options.iter().filter(|o| o.content == "Panda Express").count();
    assert_eq!(count, 1);
}

#[rstest]
#[tokio::test]
async fn rename_happens_once(state: AppState) {
    let poll_id = started(&state).await;
    state
        .polls
        .add_options(&poll_id, &[option("Wendy's", &["123", "124", "125"])])
        .await
        .unwrap();
    let old = strings(&["Wendy's"]);
    let new = strings(&["Chick-fil-A"]);

    let first = state.polls.update_options(&poll_id, &old, &new).await.unwrap();
    let second = state.polls.update_options(&poll_id, &old, &new).await.unwrap();

    assert!(first.is_complete());
    assert!(!second.is_complete());
    let poll = state.polls.get_polling(&poll_id).await.unwrap();
    assert!(poll.option("Wendy's").is_none());
    assert_eq!(poll.option("Chick-fil-A").unwrap().voted_user, strings(&["123", "124", "125"]));
}

#[rstest]
#[tokio::test]
async fn rename_onto_existing_content_is_skipped(state: AppState) {
    let poll_id = started(&state).await;
    state
        .polls
        .add_options(&poll_id, &[option("Wendy's", &[]), option("Chick-fil-A", &[])])
        .await
        .unwrap();

    let outcome = state
        .polls
        .update_options(&poll_id, &strings(&["Wendy's"]), &strings(&["Chick-fil-A"]))
        .await
        .unwrap();

    assert_eq!(outcome.skipped, strings(&["Wendy's"]));
    assert_eq!(state.polls.get_polling(&poll_id).await.unwrap().options.len(), 3);
}

#[rstest]
#[tokio::test]
async fn delete_options_removes_only_named(state: AppState) {
    let poll_id = started(&state).await;
    state
        .polls
        .add_options(&poll_id, &[option("Panda Express", &[]), option("Wendy's", &[])])
        .await
        .unwrap();

    let outcome = state
        .polls
        .delete_options(&poll_id, &strings(&["Panda Express", "Taco Bell"]))
        .await
        .unwrap();

    assert_eq!(outcome.applied, strings(&["Panda Express"]));
    assert_eq!(outcome.skipped, strings(&["Taco Bell"]));
    let contents: Vec<String> = state
        .polls
        .get_polling(&poll_id)
        .await
        .unwrap()
        .options
        .into_iter()
        .map(|o| o.content)
        .collect();
    assert_eq!(contents, strings(&["Poke Me", "Wendy's"]));
}

#[rstest]
#[tokio::test]
async fn voting_twice_counts_once(state: AppState) {
    let poll_id = started(&state).await;
    let choice = strings(&["Poke Me"]);

    state.polls.vote_options("126", &poll_id, &choice).await.unwrap();
    state.polls.vote_options("126", &poll_id, &choice).await.unwrap();

    let poll = state.polls.get_polling(&poll_id).await.unwrap();
    assert_eq!(poll.option("Poke Me").unwrap().voted_user, strings(&["124", "126"]));
}

#[rstest]
#[tokio::test]
async fn voting_for_unknown_option_is_skipped(state: AppState) {
    let poll_id = started(&state).await;

    let outcome = state
        .polls
        .vote_options("126", &poll_id, &strings(&["Poke Me", "Sushi"]))
        .await
        .unwrap();

    assert_eq!(outcome.applied, strings(&["Poke Me"]));
    assert_eq!(outcome.skipped, strings(&["Sushi"]));
}

#[rstest]
#[tokio::test]
async fn non_creator_cannot_delete(state: AppState) {
    let poll_id = started(&state).await;
    state.polls.share_polling(&poll_id, &strings(&["124"])).await.unwrap();

    let err = state.polls.delete_polling("124", &poll_id).await.unwrap_err();

    assert!(matches!(err, AppError::Unauthorized(_)));
    assert!(state.polls.get_polling(&poll_id).await.is_ok());
    let creator = state.users.get_user("123").await.unwrap();
    assert_eq!(creator.created_pollings, vec![poll_id.to_hex()]);
    let guest = state.users.get_user("124").await.unwrap();
    assert_eq!(guest.shared_pollings, vec![poll_id.to_hex()]);
}

#[rstest]
#[tokio::test]
async fn creator_delete_cascades(state: AppState) {
    let poll_id = started(&state).await;
    let other = state.polls.start_polling("123", dinner()).await.unwrap();
    state
        .polls
        .share_polling(&poll_id, &strings(&["124", "125"]))
        .await
        .unwrap();
    state.polls.share_polling(&other, &strings(&["124"])).await.unwrap();

    state.polls.delete_polling("123", &poll_id).await.unwrap();

    assert!(matches!(
        state.polls.get_polling(&poll_id).await,
        Err(AppError::NotFound(_))
    ));
    let creator = state.users.get_user("123").await.unwrap();
    assert_eq!(creator.created_pollings, vec![other.to_hex()]);
    assert_eq!(state.users.get_user("124").await.unwrap().shared_pollings, vec![other.to_hex()]);
    assert!(state.users.get_user("125").await.unwrap().shared_pollings.is_empty());
}

#[rstest]
#[tokio::test]
async fn deleting_unknown_polling_is_not_found(state: AppState) {
    let err = state
        .polls
        .delete_polling("123", &PollId::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[rstest]
#[tokio::test]
async fn related_user_entries_are_keyed_by_user(state: AppState) {
    let poll_id = started(&state).await;

    state
        .polls
        .add_users_info(&poll_id, &[info("123"), info("124")])
        .await
        .unwrap();
    let repeat = state.polls.add_users_info(&poll_id, &[info("124")]).await.unwrap();

    assert_eq!(repeat.skipped, strings(&["124"]));
    assert_eq!(state.polls.get_polling(&poll_id).await.unwrap().related_users_info.len(), 2);
}

#[rstest]
#[tokio::test]
async fn delete_users_info_leaves_others(state: AppState) {
    let poll_id = started(&state).await;
    state
        .polls
        .add_users_info(&poll_id, &[info("123"), info("124")])
        .await
        .unwrap();

    state
        .polls
        .delete_users_info(&poll_id, &strings(&["124"]))
        .await
        .unwrap();

    let poll = state.polls.get_polling(&poll_id).await.unwrap();
    assert_eq!(poll.related_users_info, vec![info("123")]);
}

#[rstest]
#[tokio::test]
async fn scheduling_fields_change_per_user(state: AppState) {
    let poll_id = started(&state).await;
    state
        .polls
        .add_users_info(&poll_id, &[info("123"), info("124")])
        .await
        .unwrap();

    let times = state
        .polls
        .change_available_times(
            &poll_id,
            &strings(&["123", "999"]),
            &[day(2), day(2)],
            &[day(4), day(4)],
        )
        .await
        .unwrap();
    state
        .polls
        .change_start_points(&poll_id, &strings(&["123"]), &strings(&["UCI"]))
        .await
        .unwrap();

    assert_eq!(times.skipped, strings(&["999"]));
    let poll = state.polls.get_polling(&poll_id).await.unwrap();
    let changed = poll.user_info("123").unwrap();
    assert_eq!(changed.available_time_to, day(4));
    assert_eq!(changed.start_point, "UCI");
    assert_eq!(poll.user_info("124").unwrap(), &info("124"));
}

#[rstest]
#[case::options(vec!["a", "b"], vec!["c"])]
#[case::empty_new(vec!["a"], vec![])]
#[tokio::test]
async fn uneven_start_points_are_rejected(
    state: AppState,
    #[case] users: Vec<&str>,
    #[case] points: Vec<&str>,
) {
    let poll_id = started(&state).await;

    let err = state
        .polls
        .change_start_points(&poll_id, &strings(&users), &strings(&points))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
}

#[rstest]
#[tokio::test]
async fn mutations_on_unknown_polling_are_not_found(state: AppState) {
    let missing = PollId::new();

    let add = state.polls.add_options(&missing, &[option("x", &[])]).await;
    let vote = state.polls.vote_options("1", &missing, &strings(&["x"])).await;
    let share = state.polls.share_polling(&missing, &strings(&["1"])).await;

    assert!(matches!(add, Err(AppError::NotFound(_))));
    assert!(matches!(vote, Err(AppError::NotFound(_))));
    assert!(matches!(share, Err(AppError::NotFound(_))));
    assert!(!state.users.user_exists("1").await.unwrap());
}
