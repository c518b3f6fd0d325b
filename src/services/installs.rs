use crate::error::Result;
use crate::models::install::AppInstall;
use crate::repositories::install::InstallRepository;
use crate::repositories::user::UserRepository;

/// Records an install event.
///
/// First sight of a user through an install report registers it the same
/// way a session start would, with the reported OS version standing in
/// for the device OS.
pub async fn report_install(
    users: &dyn UserRepository,
    installs: &dyn InstallRepository,
    external_id: &str,
    os_version: &str,
    app_version: &str,
) -> Result<AppInstall> {
    let user =
        super::sessions::get_or_create_user(users, external_id, os_version, app_version).await?;
    let install = installs.create(user.id, os_version, app_version).await?;
    tracing::debug!(user = %user.external_id, install = %install.id, "install recorded");
    Ok(install)
}
