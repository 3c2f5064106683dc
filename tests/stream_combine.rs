mod common;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, ReadBuf, duplex};

use spawnkit::stream::{BoxedSource, EventEmitter, wait_for_event};
use spawnkit::combine_streams;

/// Source that fails on the first read.
struct FailingSource;

impl AsyncRead for FailingSource {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "source broke")))
    }
}

#[tokio::test]
async fn works_with_a_single_stream() -> TestResult {
    init_tracing();

    let (mut writer, reader) = duplex(64);
    let mut combined = combine_streams(vec![reader]);

    writer.write_all(b"foo").await?;
    drop(writer);

    let mut out = String::new();
    with_timeout(combined.read_to_string(&mut out)).await?;
    assert_eq!(out, "foo");
    Ok(())
}

#[tokio::test]
async fn works_with_multiple_streams() -> TestResult {
    init_tracing();

    let (mut w0, r0) = duplex(64);
    let (mut w1, r1) = duplex(64);
    let mut combined = combine_streams(vec![r0, r1]);

    w0.write_all(b"foo").await?;
    let first = with_timeout(combined.next_chunk()).await.expect("first chunk")?;
    assert_eq!(first.source, 0);
    assert_eq!(first.data, b"foo");

    w1.write_all(b"bar").await?;
    let second = with_timeout(combined.next_chunk()).await.expect("second chunk")?;
    w0.write_all(b"baz").await?;
    let third = with_timeout(combined.next_chunk()).await.expect("third chunk")?;

    let mut rest = String::from_utf8(second.data)?;
    rest.push_str(std::str::from_utf8(&third.data)?);
    assert_eq!(rest, "barbaz");
    assert_eq!((second.source, third.source), (1, 0));
    Ok(())
}

#[tokio::test]
async fn ends_only_after_every_source_ends() -> TestResult {
    init_tracing();

    let (w0, r0) = duplex(64);
    let (mut w1, r1) = duplex(64);
    let mut combined = combine_streams(vec![r0, r1]);

    drop(w0);
    let still_open = tokio::time::timeout(Duration::from_millis(50), combined.next_chunk()).await;
    assert!(still_open.is_err(), "stream ended while a source was open");

    w1.write_all(b"late").await?;
    drop(w1);

    let mut out = Vec::new();
    with_timeout(combined.read_to_end(&mut out)).await?;
    assert_eq!(out, b"late");
    Ok(())
}

#[tokio::test]
async fn empty_source_list_ends_immediately() -> TestResult {
    init_tracing();

    let mut combined = combine_streams(Vec::<BoxedSource>::new());
    assert!(with_timeout(combined.next_chunk()).await.is_none());
    Ok(())
}

#[tokio::test]
async fn source_error_fails_the_combined_stream() -> TestResult {
    init_tracing();

    let (_writer, reader) = duplex(64);
    let sources: Vec<BoxedSource> = vec![Box::new(reader), Box::new(FailingSource)];
    let mut combined = combine_streams(sources);

    let err = with_timeout(combined.next_chunk())
        .await
        .expect("an error item")
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    assert!(with_timeout(combined.next_chunk()).await.is_none());
    Ok(())
}

#[tokio::test]
async fn waiter_resolves_after_emit_from_another_task() -> TestResult {
    init_tracing();

    let emitter = std::sync::Arc::new(EventEmitter::new());
    let waiter = wait_for_event(&emitter, "close");

    let remote = std::sync::Arc::clone(&emitter);
    tokio::spawn(async move {
        remote.emit("close");
    });

    with_timeout(waiter).await?;
    assert_eq!(emitter.listener_count("close"), 0);
    Ok(())
}

#[tokio::test]
async fn surviving_sources_keep_flowing_after_an_error() -> TestResult {
    init_tracing();

    let (mut writer, reader) = duplex(64);
    let sources: Vec<BoxedSource> = vec![Box::new(reader), Box::new(FailingSource)];
    let mut combined = combine_streams(sources);

    // Far more than the duplex buffer; only completes if someone keeps reading.
    let writes = tokio::spawn(async move {
        writer.write_all(&[b'x'; 16 * 1024]).await?;
        drop(writer);
        Ok::<_, io::Error>(())
    });

    let first = with_timeout(combined.next_chunk()).await.expect("an item");
    let err = match first {
        Err(e) => e,
        Ok(_) => with_timeout(async {
            loop {
                match combined.next_chunk().await {
                    Some(Err(e)) => break e,
                    Some(Ok(_)) => continue,
                    None => panic!("stream ended without the source error"),
                }
            }
        })
        .await,
    };
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

    with_timeout(combined.discard_remaining()).await;
    with_timeout(writes).await??;
    assert!(combined.next_chunk().await.is_none());
    Ok(())
}
