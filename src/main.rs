use std::io::{self, BufRead, Write};
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use toolcheck_rs::config::{load_config, AppConfig, ParseMode};
use toolcheck_rs::error::ToolCheckError;
use toolcheck_rs::fc::retry::RetryContext;
use toolcheck_rs::fc::{StreamingToolCallParser, ToolsOutputParser};
use toolcheck_rs::observability::{init_tracing, log_stream_complete, StreamStats};
use toolcheck_rs::protocol::canonical::GenerationChunk;

const DEFAULT_CONFIG_PATH: &str = "toolcheck.yaml";

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let (config, parser) = startup(&config_path).unwrap_or_else(|e| {
        eprintln!("Failed to start from '{config_path}': {e}");
        if matches!(e, ToolCheckError::Config(_)) {
            eprintln!("Please copy 'config.example.yaml' to '{DEFAULT_CONFIG_PATH}' and modify as needed.");
        }
        std::process::exit(1);
    });

    init_tracing(&config.features.log_level);

    tracing::info!(
        "toolcheck starting in {} mode (schema={})",
        config.parser.mode,
        parser.schema().is_some()
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match config.parser.mode {
        ParseMode::Stream => run_stream(&config, &parser, stdin.lock(), &mut out),
        ParseMode::Final => run_final(&config, &parser, stdin.lock(), &mut out),
    };

    if let Err(err) = result.and_then(|()| out.flush()) {
        eprintln!("I/O error: {err}");
        std::process::exit(1);
    }
}

fn startup(config_path: &str) -> Result<(AppConfig, ToolsOutputParser), ToolCheckError> {
    let config = load_config(config_path)?;
    let parser = ToolsOutputParser::from_config(&config)?;
    Ok((config, parser))
}

#[derive(Debug, Serialize)]
struct StreamReport {
    arguments: Value,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    last: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    correction_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
struct FailureReport {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correction_prompt: Option<String>,
}

fn run_stream<R: BufRead, W: Write>(
    config: &AppConfig,
    parser: &ToolsOutputParser,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    let started = Instant::now();
    let mut stream = StreamingToolCallParser::new();
    let mut stats = StreamStats::default();

    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        let Some(chunk) = parse_chunk_line(idx + 1, &line) else {
            continue;
        };
        stats.record_chunk(!chunk.tool_calls().is_empty());

        let arguments = stream.process_chunk(&chunk);
        let error = parser.validate_result(&arguments).err().map(|err| {
            stats.record_validation_failure();
            err.to_string()
        });
        write_json_line(
            out,
            &StreamReport {
                valid: error.is_none(),
                arguments,
                error,
                last: false,
                correction_prompt: None,
            },
        )?;
    }

    // Partial chunks are expected to be incomplete; only the last accepted
    // arguments are worth a correction round.
    if let Some(latest) = stream.latest() {
        let outcome = parser.validate_result(&latest.arguments);
        let retry = RetryContext::new(&config.features);
        let (error, correction_prompt) = match outcome {
            Ok(_) => (None, None),
            Err(err) => {
                let prompt = if retry.should_continue(true) {
                    retry.prompt_for(&err)
                } else {
                    None
                };
                (Some(err.to_string()), prompt)
            }
        };
        write_json_line(
            out,
            &StreamReport {
                arguments: latest.arguments.clone(),
                valid: error.is_none(),
                error,
                last: true,
                correction_prompt,
            },
        )?;
    }

    log_stream_complete(&stats, started.elapsed());
    Ok(())
}

fn run_final<R: BufRead, W: Write>(
    config: &AppConfig,
    parser: &ToolsOutputParser,
    input: R,
    out: &mut W,
) -> io::Result<()> {
    let mut chunks = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        if let Some(chunk) = parse_chunk_line(idx + 1, &line) {
            chunks.push(chunk);
        }
    }

    match parser.parse_result(&chunks) {
        Ok(calls) => {
            tracing::info!(chunks = chunks.len(), calls = calls.len(), "final parse complete");
            write_json_line(out, &calls)
        }
        Err(err) => {
            tracing::warn!(error = %err, "final parse failed");
            let retry = RetryContext::new(&config.features);
            let correction_prompt = if retry.should_continue(err.is_recoverable()) {
                retry.prompt_for(&err)
            } else {
                None
            };
            write_json_line(
                out,
                &FailureReport {
                    error: err.to_string(),
                    correction_prompt,
                },
            )
        }
    }
}

fn parse_chunk_line(line_no: usize, line: &str) -> Option<GenerationChunk> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(chunk) => Some(chunk),
        Err(err) => {
            tracing::warn!("skipping malformed chunk on line {line_no}: {err}");
            None
        }
    }
}

fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")
}
