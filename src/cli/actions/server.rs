use crate::cli::actions::Action;
use crate::tutela;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            violation_limit,
        } => {
            tutela::new(port, dsn, violation_limit).await?;
        }
    }

    Ok(())
}
