//! Single GET transfers over libcurl: into a destination file, or into memory.

use std::cell::{Cell, RefCell};
use std::io;
use std::path::Path;
use std::str;

use curl::easy::Easy;

use super::{CurlOptions, FetchMode, TransferKind, TransferStats};
use crate::retry::TransferError;
use crate::storage::StorageWriter;

const USER_AGENT: &str = concat!("confdl/", env!("CARGO_PKG_VERSION"));

/// Rejects anything that is not an absolute http(s) URL.
fn check_url(url: &str) -> Result<(), TransferError> {
    let parsed = url::Url::parse(url).map_err(|e| TransferError::invalid_url(url, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(TransferError::invalid_url(
            url,
            format!("unsupported scheme {other:?}"),
        )),
    }
}

fn configure(easy: &mut Easy, url: &str, opts: &CurlOptions) -> Result<(), TransferError> {
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent(USER_AGENT)?;
    easy.connect_timeout(opts.connect_timeout)?;
    // Low-speed abort instead of a wall-clock timeout: session videos are large.
    easy.low_speed_limit(opts.low_speed_limit)?;
    easy.low_speed_time(opts.low_speed_time)?;
    if let Some(speed) = opts.max_recv_speed {
        easy.max_recv_speed(speed)?;
    }
    Ok(())
}

/// Status code from a status line such as `HTTP/1.1 206 Partial Content`.
/// Redirects produce several status lines per transfer; the last one wins.
fn parse_status_line(line: &[u8]) -> Option<u32> {
    let line = str::from_utf8(line).ok()?;
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

fn is_success(code: u32) -> bool {
    (200..300).contains(&code)
}

/// GET `url` into `dest`.
///
/// `FetchMode::Fresh` creates or truncates `dest`. `FetchMode::Resume` asks for
/// the bytes after the current file length: a 206 reply is appended, a 200
/// reply (range ignored) replaces the file, and a 416 reply means the file
/// was already complete. Bodies of non-2xx replies are never written.
pub fn download_to_file(
    url: &str,
    dest: &Path,
    mode: FetchMode,
    opts: &CurlOptions,
) -> Result<TransferStats, TransferError> {
    check_url(url)?;
    let writer = match mode {
        FetchMode::Fresh => StorageWriter::create(dest),
        FetchMode::Resume => StorageWriter::open_existing(dest),
    }
    .map_err(TransferError::Storage)?;

    let result = transfer_into(&writer, url, mode, opts);
    // Don't leave an empty file behind: the next run would treat it as a partial download.
    if mode == FetchMode::Fresh && result.is_err() && writer.is_empty().unwrap_or(false) {
        drop(writer);
        let _ = std::fs::remove_file(dest);
    }
    result
}

fn transfer_into(
    writer: &StorageWriter,
    url: &str,
    mode: FetchMode,
    opts: &CurlOptions,
) -> Result<TransferStats, TransferError> {
    let offset = match mode {
        FetchMode::Fresh => 0,
        FetchMode::Resume => writer.len().map_err(TransferError::Storage)?,
    };

    let mut easy = Easy::new();
    configure(&mut easy, url, opts)?;
    if offset > 0 {
        // Plain Range header rather than CURLOPT_RESUME_FROM: libcurl fails a
        // resume outright when the server ignores the range.
        easy.range(&format!("{}-", offset))?;
    }

    let status = Cell::new(0u32);
    // File offset of the first body byte; decided when the first chunk arrives.
    let body_start: Cell<Option<u64>> = Cell::new(None);
    let written = Cell::new(0u64);
    let storage_error: RefCell<Option<io::Error>> = RefCell::new(None);

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            if let Some(code) = parse_status_line(line) {
                status.set(code);
            }
            true
        })?;
        transfer.write_function(|data| {
            let code = status.get();
            if !is_success(code) {
                return Ok(data.len());
            }
            let start = match body_start.get() {
                Some(start) => start,
                None => {
                    let start = if code == 206 { offset } else { 0 };
                    if start == 0 && offset > 0 {
                        if let Err(e) = writer.truncate() {
                            *storage_error.borrow_mut() = Some(e);
                            return Ok(0);
                        }
                    }
                    body_start.set(Some(start));
                    start
                }
            };
            match writer.write_at(start + written.get(), data) {
                Ok(()) => {
                    written.set(written.get() + data.len() as u64);
                    Ok(data.len())
                }
                Err(e) => {
                    *storage_error.borrow_mut() = Some(e);
                    Ok(0) // abort transfer
                }
            }
        })?;
        if let Err(e) = transfer.perform() {
            if e.is_write_error() {
                if let Some(io_err) = storage_error.borrow_mut().take() {
                    return Err(TransferError::Storage(io_err));
                }
            }
            return Err(TransferError::Curl(e));
        }
    }

    let code = easy.response_code()?;
    if mode == FetchMode::Resume && code == 416 {
        tracing::debug!(url, offset, "range not satisfiable, file already complete");
        return Ok(TransferStats {
            kind: TransferKind::AlreadyComplete,
            bytes_written: 0,
        });
    }
    if !is_success(code) {
        return Err(TransferError::Http(code));
    }
    writer.sync().map_err(TransferError::Storage)?;

    let kind = match mode {
        FetchMode::Resume if code == 206 => TransferKind::Resumed { from: offset },
        FetchMode::Resume if offset > 0 => TransferKind::Restarted,
        _ => TransferKind::Fresh,
    };
    tracing::debug!(
        url,
        path = %writer.path().display(),
        bytes = written.get(),
        ?kind,
        "transfer complete"
    );
    Ok(TransferStats {
        kind,
        bytes_written: written.get(),
    })
}

/// GET `url` into memory (catalog JSON). Fails on any non-2xx final status.
pub fn get_bytes(url: &str, opts: &CurlOptions) -> Result<Vec<u8>, TransferError> {
    check_url(url)?;
    let mut easy = Easy::new();
    configure(&mut easy, url, opts)?;
    easy.accept_encoding("")?;

    let body: RefCell<Vec<u8>> = RefCell::new(Vec::new());
    {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            // A new status line starts a new response (redirect hop); drop earlier bodies.
            if parse_status_line(line).is_some() {
                body.borrow_mut().clear();
            }
            true
        })?;
        transfer.write_function(|data| {
            body.borrow_mut().extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !is_success(code) {
        return Err(TransferError::Http(code));
    }
    Ok(body.into_inner())
}
