//! `lines` source: lines of a file, or a fixed list of words.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ddu_core::{Item, Params};
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

use crate::source::{GatherArgs, ItemStream, Source};

const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Streams `params.path` line by line in batches of `params.chunkSize`.
///
/// When `params.items` is a non-empty list of strings it is used instead of
/// a file. Relative paths resolve against `sourceOptions.path`, falling
/// back to the context path.
pub struct LinesSource;

enum ReadState {
    Pending(PathBuf),
    Reading(Lines<BufReader<File>>),
    Done,
}

impl LinesSource {
    fn chunk_size(params: &Params) -> usize {
        params
            .get("chunkSize")
            .and_then(Value::as_u64)
            .map(|n| usize::try_from(n.max(1)).unwrap_or(usize::MAX))
            .unwrap_or(DEFAULT_CHUNK_SIZE)
    }

    fn resolve_path(args: &GatherArgs, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        let base = if args.source_options.path.is_empty() {
            args.context.path.clone()
        } else {
            PathBuf::from(&args.source_options.path)
        };
        base.join(path)
    }

    fn read_file(path: PathBuf, chunk_size: usize) -> ItemStream {
        stream::unfold(ReadState::Pending(path), move |state| async move {
            let mut lines = match state {
                ReadState::Done => return None,
                ReadState::Reading(lines) => lines,
                ReadState::Pending(path) => match File::open(&path).await {
                    Ok(file) => {
                        debug!(path = %path.display(), "Reading lines");
                        BufReader::new(file).lines()
                    }
                    Err(e) => {
                        let err = anyhow::Error::new(e)
                            .context(format!("cannot open {}", path.display()));
                        return Some((Err(err), ReadState::Done));
                    }
                },
            };

            let mut batch = Vec::with_capacity(chunk_size.min(DEFAULT_CHUNK_SIZE));
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        batch.push(Item::new(line));
                        if batch.len() >= chunk_size {
                            return Some((Ok(batch), ReadState::Reading(lines)));
                        }
                    }
                    Ok(None) if batch.is_empty() => return None,
                    Ok(None) => return Some((Ok(batch), ReadState::Done)),
                    Err(e) => return Some((Err(e.into()), ReadState::Done)),
                }
            }
        })
        .boxed()
    }
}

#[async_trait]
impl Source for LinesSource {
    fn name(&self) -> &str {
        "lines"
    }

    fn kind(&self) -> &str {
        "word"
    }

    fn gather(&self, args: GatherArgs) -> ItemStream {
        let chunk_size = Self::chunk_size(&args.source_params);

        let words: Vec<Item> = args
            .source_params
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(Item::new)
                    .collect()
            })
            .unwrap_or_default();

        if !words.is_empty() {
            let batches: Vec<anyhow::Result<Vec<Item>>> = words
                .chunks(chunk_size)
                .map(|chunk| Ok(chunk.to_vec()))
                .collect();
            return stream::iter(batches).boxed();
        }

        match args.source_params.get("path").and_then(Value::as_str) {
            Some(path) if !path.is_empty() => {
                Self::read_file(Self::resolve_path(&args, path), chunk_size)
            }
            _ => stream::once(async {
                Err::<Vec<Item>, _>(anyhow::anyhow!(
                    "lines source needs params.path or params.items"
                ))
            })
            .boxed(),
        }
    }

    fn params(&self) -> Params {
        let mut params = Params::new();
        params.insert("path".into(), json!(""));
        params.insert("items".into(), json!([]));
        params.insert("chunkSize".into(), json!(DEFAULT_CHUNK_SIZE));
        params
    }
}
