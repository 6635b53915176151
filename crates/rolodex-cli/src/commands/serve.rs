//! `rolodex serve` — Assistant sessions over TCP.
//!
//! Every connection gets the greeting, then one reply per input line. Each
//! reply is followed by an empty line so that clients can tell where it
//! ends. All connections share a single address book.

use std::future::Future;
use std::sync::Arc;

use clap::Args;
use rolodex_book::assistant::{Assistant, GREETING, Outcome};
use rolodex_common::config::RolodexConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::session::SharedBook;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Socket address to listen on (defaults to the configured address).
    #[arg(long, env = "ROLODEX_LISTEN")]
    pub listen: Option<String>,
}

/// Executes the `serve` command until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the book cannot be loaded, the address cannot be
/// bound, or the final save fails.
pub fn execute(args: ServeArgs, config: RolodexConfig) -> anyhow::Result<()> {
    let listen = args.listen.unwrap_or(config.listen);
    let shared = Arc::new(SharedBook::open(
        &config.data_file,
        Assistant::new(config.upcoming_days),
    )?);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let listener = TcpListener::bind(&listen).await?;
        let local = listener.local_addr()?;
        #[allow(clippy::print_stderr)]
        {
            eprintln!("Serving the assistant on {local}");
        }
        serve_on(listener, shared, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    })
}

/// Accepts connections on `listener` until `shutdown` resolves, then saves.
pub async fn serve_on(
    listener: TcpListener,
    shared: Arc<SharedBook>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("shutdown requested");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let session = uuid::Uuid::new_v4();
                tracing::info!(%peer, %session, "connection accepted");
                let shared = Arc::clone(&shared);
                drop(tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, &shared).await {
                        tracing::warn!(%session, error = %e, "session ended with an error");
                    }
                    tracing::info!(%session, "connection closed");
                }));
            }
        }
    }
    shared.save()
}

async fn handle_connection(stream: TcpStream, shared: &SharedBook) -> anyhow::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    write_half.write_all(format!("{GREETING}\n").as_bytes()).await?;
    while let Some(line) = lines.next_line().await? {
        let Some(reply) = shared.respond(&line)? else {
            continue;
        };
        write_half
            .write_all(format!("{}\n\n", reply.text).as_bytes())
            .await?;
        match reply.outcome {
            Outcome::Continue => {}
            Outcome::Modified => shared.save()?,
            Outcome::Exit => {
                shared.save()?;
                break;
            }
        }
    }
    write_half.shutdown().await?;
    Ok(())
}
