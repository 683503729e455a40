//! Arity checks for host-native functions.
//!
//! Each returns `ArgumentError { want, got }`; `min_args`/`max_args` report
//! the violated bound as `want`.

use crate::errors::{wrong_arg_count, EvalError};
use crate::value::Value;

pub fn exact_args(args: &[Value], want: usize) -> Result<(), EvalError> {
    if args.len() == want {
        Ok(())
    } else {
        Err(wrong_arg_count(want, args.len()))
    }
}

/// Accepts `min..=max` arguments.
pub fn range_args(args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if args.len() < min {
        Err(wrong_arg_count(min, args.len()))
    } else if args.len() > max {
        Err(wrong_arg_count(max, args.len()))
    } else {
        Ok(())
    }
}

pub fn min_args(args: &[Value], min: usize) -> Result<(), EvalError> {
    if args.len() < min {
        Err(wrong_arg_count(min, args.len()))
    } else {
        Ok(())
    }
}

pub fn max_args(args: &[Value], max: usize) -> Result<(), EvalError> {
    if args.len() > max {
        Err(wrong_arg_count(max, args.len()))
    } else {
        Ok(())
    }
}
