mod cli;
mod output;

use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, IdCommand, OutputFormat, RoleCommand, RqlCommand, SearchArgs};
use prismatf::backoff::PolicyError;
use prismatf::config::{self, RetrySettings};
use prismatf::prismacloud::{PrismaApi, SearchType, TimeRange};
use prismatf::resource_id;
use prismatf::resources::{RqlSearch, RqlSearchConfig, UserRoleDataSource, UserRoleLookup};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::Id { command } = &cli.command {
        match command {
            IdCommand::Encode { parts } => println!("{}", resource_id::encode(parts.as_slice())),
            IdCommand::Decode { token } => {
                let parts = resource_id::decode(token)?;
                println!("{}", output::json(&parts)?);
            }
        }
        return Ok(());
    }

    let mut provider = config::load_or_default(cli.connection.config_file.as_deref())?;
    cli.connection.apply(&mut provider);
    let client = provider.connect().await?;

    match cli.command {
        Command::Id { .. } => {}
        Command::Rql { command } => {
            let (retry, format) = match &command {
                RqlCommand::Create(args) => (&args.retry, args.output),
                RqlCommand::Read(args) => (&args.retry, args.output),
            };
            let mut settings = provider.retry.clone();
            retry.apply(&mut settings);

            let handler = rql_handler(&client, &settings, &command)?;

            let state = match &command {
                RqlCommand::Create(args) => {
                    let search = search_config(args.search_type, &args.query, &args.search);
                    Some(handler.create(&search).await?)
                }
                RqlCommand::Read(args) => {
                    // NOTE: type and query are taken from the id on read
                    let search = search_config(SearchType::default(), "", &args.search);
                    handler.read(&args.id, &search).await?
                }
            };

            let state = state.ok_or_else(|| eyre!("rql search no longer exists"))?;
            tracing::info!(count = state.result.data.len(), "search complete");
            match format {
                OutputFormat::Json => println!("{}", output::json(&state)?),
                OutputFormat::Table => {
                    println!("id: {}", state.id);
                    println!("{}", output::search_table(&state.result.data));
                }
            }
        }
        Command::Role { command } => match command {
            RoleCommand::Show {
                role_id,
                name,
                retry,
                output: format,
            } => {
                let mut settings = provider.retry.clone();
                retry.apply(&mut settings);

                let lookup = UserRoleLookup {
                    role_id,
                    name,
                    backoff_retry: settings.backoff_retry,
                    max_retries: settings.max_retries,
                };
                let role = UserRoleDataSource::new(&client)
                    .with_base_delay(Duration::from_millis(settings.base_delay_ms))
                    .read(&lookup)
                    .await?
                    .ok_or_else(|| eyre!("user role not found"))?;

                match format {
                    OutputFormat::Json => println!("{}", output::json(&role)?),
                    OutputFormat::Table => println!("{}", output::role_table(&role)),
                }
            }
        },
    }

    Ok(())
}

/// Only the policy the command will use is built.
fn rql_handler<'a, A: PrismaApi + ?Sized>(
    api: &'a A,
    settings: &RetrySettings,
    command: &RqlCommand,
) -> Result<RqlSearch<'a, A>, PolicyError> {
    let handler = RqlSearch::new(api);
    match command {
        RqlCommand::Create(_) => Ok(handler.with_create_policy(settings.polling_policy()?)),
        RqlCommand::Read(_) => Ok(handler.with_read_policy(settings.policy()?)),
    }
}

fn search_config(search_type: SearchType, query: &str, args: &SearchArgs) -> RqlSearchConfig {
    RqlSearchConfig {
        limit: args.limit,
        skip_result: args.skip_result,
        heuristic_search: args.heuristic_search,
        time_range: TimeRange::Relative {
            amount: args.time_amount,
            unit: args.time_unit.clone(),
        },
        ..RqlSearchConfig::new(search_type, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prismatf::PrismaClient;

    fn rql_command(args: &[&str]) -> RqlCommand {
        match Cli::parse_from(args).command {
            Command::Rql { command } => command,
            other => panic!("Expected Rql command, got {:?}", other),
        }
    }

    #[test]
    fn test_read_ignores_polling_settings_without_backoff() {
        let client = PrismaClient::new("test_token".to_string()).unwrap();
        let settings = RetrySettings {
            max_retries: -1,
            ..RetrySettings::default()
        };

        let read = rql_command(&["prismatf", "rql", "read", "some-id"]);
        assert!(rql_handler(&client, &settings, &read).is_ok());

        let create = rql_command(&["prismatf", "rql", "create", "--query=config from x"]);
        assert!(matches!(
            rql_handler(&client, &settings, &create),
            Err(PolicyError::NegativeRetries(-1))
        ));
    }

    #[test]
    fn test_read_with_backoff_validates_settings() {
        let client = PrismaClient::new("test_token".to_string()).unwrap();
        let settings = RetrySettings {
            backoff_retry: true,
            max_delay_ms: 10,
            base_delay_ms: 500,
            ..RetrySettings::default()
        };

        let read = rql_command(&["prismatf", "rql", "read", "some-id"]);
        assert!(matches!(
            rql_handler(&client, &settings, &read),
            Err(PolicyError::MaxBelowBase { .. })
        ));
    }
}
