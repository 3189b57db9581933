use pipeframe_transport::{method_of, DecodeErrorPolicy, FramedTransport, Message, TransportConfig};
use tokio::io::AsyncWrite;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::cmd::EchoArgs;
use crate::exit::{read_loop_exit, transport_error, CliError, CliResult, INTERNAL, SUCCESS};

pub fn run(args: EchoArgs) -> CliResult<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))?;

    let mut config = TransportConfig::from_env();
    if args.skip_invalid {
        config = config.with_decode_error_policy(DecodeErrorPolicy::Skip);
    }

    let result = runtime.block_on(async {
        let transport = FramedTransport::new(
            tokio::io::stdin(),
            tokio::io::stdout(),
            config,
            &Handle::current(),
        );
        tokio::select! {
            res = echo(transport, args.count) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                Ok(SUCCESS)
            }
        }
    });

    // Stdin is read on a blocking thread that may never return.
    runtime.shutdown_background();
    result
}

/// Echo messages until the read loop ends or `count` messages went back.
async fn echo<W>(transport: FramedTransport<W>, count: Option<usize>) -> CliResult<i32>
where
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    transport.set_handler(move |message| {
        let _ = tx.send(message);
    });

    let mut echoed = 0usize;
    let exit = loop {
        if count.is_some_and(|count| echoed >= count) {
            transport.shutdown();
            return Ok(SUCCESS);
        }

        tokio::select! {
            biased;
            Some(message) = rx.recv() => {
                echo_one(&transport, &message).await?;
                echoed += 1;
            }
            exit = transport.closed() => break exit,
        }
    };

    // The handler runs before the exit is published, so anything it queued
    // is already in the channel.
    while let Ok(message) = rx.try_recv() {
        if count.is_some_and(|count| echoed >= count) {
            break;
        }
        echo_one(&transport, &message).await?;
        echoed += 1;
    }

    tracing::debug!(echoed, ?exit, "echo finished");
    read_loop_exit("receive failed", &exit)
}

async fn echo_one<W>(transport: &FramedTransport<W>, message: &Message) -> CliResult<()>
where
    W: AsyncWrite + Unpin,
{
    tracing::info!(method = method_of(message).unwrap_or("-"), "echoing message");
    transport
        .send(message)
        .await
        .map_err(|err| transport_error("echo send failed", &err))
}
