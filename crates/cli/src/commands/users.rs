//! User listing command.

use dompee_site::backend::BackendClient;

use super::{CliError, fit};

/// Print every remote account.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached.
pub async fn list(client: &BackendClient) -> Result<(), CliError> {
    let users = client.get_users().await?;
    tracing::info!(count = users.len(), "Fetched users");

    #[allow(clippy::print_stdout)]
    {
        println!("{:<32}  {:<24}  {:<10}", "EMAIL", "NAME", "ROLE");
        for user in &users {
            println!(
                "{:<32}  {:<24}  {:<10}",
                fit(&user.email, 32),
                fit(&user.full_name(), 24),
                user.role
            );
        }
    }
    Ok(())
}
