//! `time`: wall clock, monotonic clock and an interruptible `sleep`.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use sling_value::args::exact_args;
use sling_value::errors::value_error;
use sling_value::{EvalResult, ExecContext, Kwargs, Library, Value};

pub fn time() -> Arc<Library> {
    static LIBRARY: OnceLock<Arc<Library>> = OnceLock::new();
    Arc::clone(LIBRARY.get_or_init(|| {
        Library::builder("time")
            .description("Time access and sleeping")
            .function(
                "sleep",
                "sleep(seconds) - pause; interrupted by timeout or cancellation",
                sleep,
            )
            .function("time", "time() - seconds since the Unix epoch", now)
            .function(
                "monotonic",
                "monotonic() - seconds from a clock that never goes backwards",
                monotonic,
            )
            .build()
    }))
}

/// Sleeps on the context, so a deadline or cancel wakes it early with the
/// matching error.
fn sleep(ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 1)?;
    let seconds = args[0].as_float()?;
    let duration = Duration::try_from_secs_f64(seconds)
        .map_err(|_| value_error("sleep length must be non-negative"))?;
    tracing::trace!(?duration, "time.sleep");
    ctx.sleep(duration)?;
    Ok(Value::Null)
}

fn now(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    exact_args(&args, 0)?;
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    Ok(Value::Float(since_epoch.as_secs_f64()))
}

fn monotonic(_ctx: &ExecContext, _kwargs: Kwargs, args: Vec<Value>) -> EvalResult {
    static START: OnceLock<Instant> = OnceLock::new();
    exact_args(&args, 0)?;
    let start = START.get_or_init(Instant::now);
    Ok(Value::Float(start.elapsed().as_secs_f64()))
}
