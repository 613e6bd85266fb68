//! User profile commands.

use comanda_core::{ProfileDraft, UserId, UserRole};
use comanda_server::state::AppState;

use super::print_json;

/// Print profiles, optionally filtered by name or email.
pub async fn list(state: &AppState, query: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mut users = state.users().list_all().await?;
    if let Some(text) = query {
        users.retain(|u| u.matches(text));
    }
    print_json(&users)?;
    Ok(())
}

/// Create or update a profile from the given fields.
pub async fn upsert(
    state: &AppState,
    uid: &str,
    email: Option<String>,
    display_name: Option<String>,
    role: Option<UserRole>,
) -> Result<(), Box<dyn std::error::Error>> {
    let draft = ProfileDraft {
        email,
        display_name,
        role,
        created_at: None,
    };
    let profile = state
        .users()
        .create_or_update_profile(&UserId::new(uid), draft)
        .await?;
    print_json(&profile)?;
    Ok(())
}

/// Change a role and print the resulting roster.
///
/// On failure the printed roster is the re-fetched one.
pub async fn role(
    state: &AppState,
    uid: &str,
    role: UserRole,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut roster = state.users().list_all().await?;
    let result = state
        .users()
        .change_role(&mut roster, &UserId::new(uid), role)
        .await;
    print_json(&roster)?;
    result?;

    tracing::info!(%uid, %role, "Role updated");
    Ok(())
}
