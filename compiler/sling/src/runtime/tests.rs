#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use sling_value::args::exact_args;

use super::*;

fn runtime() -> Runtime {
    Runtime::builder().capture_output().build()
}

fn host_message(err: ScriptError) -> String {
    match err {
        ScriptError::Host(message) => message,
        other => panic!("expected a host error, got {other:?}"),
    }
}

#[test]
fn runtime_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Runtime>();
}

#[test]
fn eval_returns_last_expression_and_keeps_globals() {
    let rt = runtime();
    assert_eq!(rt.eval("x = 20\nx + 1").unwrap(), Value::Int(21));
    assert_eq!(rt.eval("x * 2").unwrap(), Value::Int(40));
    assert_eq!(rt.eval("y = 1").unwrap(), Value::Null);
}

#[test]
fn parse_errors_are_reported_as_parse() {
    let err = runtime().eval("def (").unwrap_err();
    assert!(matches!(err, ScriptError::Parse(_)));
}

#[test]
fn runtime_errors_carry_their_type() {
    let err = runtime().eval("x = 1\nint('nope')").unwrap_err();
    let eval = err.as_eval().unwrap();
    assert_eq!(eval.exception_type(), "ValueError");
    assert_eq!(eval.line, Some(2));
}

#[test]
fn system_exit() {
    let rt = runtime();
    assert_eq!(rt.eval("raise SystemExit(0)").unwrap(), Value::Null);
    assert!(matches!(
        rt.eval("raise SystemExit(2)"),
        Err(ScriptError::Exit { code: 2 })
    ));
}

#[test]
fn timeouts() {
    let rt = runtime();
    let err = rt
        .eval_with_timeout(Duration::from_millis(30), "while True:\n    pass\n")
        .unwrap_err();
    assert!(err.as_eval().unwrap().is_timeout());

    let rt = Runtime::builder()
        .capture_output()
        .timeout(Duration::from_millis(30))
        .build();
    let err = rt.eval("import time\ntime.sleep(10)").unwrap_err();
    assert!(err.as_eval().unwrap().is_timeout());
}

#[test]
fn cancellation_through_the_context() {
    let rt = runtime();
    let ctx = ExecContext::background();
    ctx.cancel();
    let err = rt.eval_with_context(&ctx, "1 + 1").unwrap_err();
    assert!(err.as_eval().unwrap().is_cancelled());
}

#[test]
fn variables_round_trip_through_host_values() {
    let rt = runtime();
    rt.set_var("n", 41);
    rt.set_var("name", "sling");
    rt.set_var("ratio", 2.5);
    rt.set_var("whole", 3.0);
    rt.set_var("items", vec![1, 2]);
    rt.set_var("config", HashMap::from([("debug".to_string(), true)]));
    rt.eval("n = n + 1").unwrap();

    assert_eq!(rt.get_var("n"), Some(HostValue::Int(42)));
    assert_eq!(rt.get_var_as_string("name").unwrap(), "sling");
    assert_eq!(rt.get_var_as_float("ratio").unwrap(), 2.5);
    assert_eq!(rt.get_value("whole"), Some(Value::Int(3)));
    assert_eq!(rt.get_var_as_list("items").unwrap().len(), 2);
    assert!(rt.get_var_as_dict("config").unwrap().contains_key("debug"));
    assert!(rt.eval("config['debug']").unwrap().is_truthy());
}

#[test]
fn missing_and_mistyped_variables() {
    let rt = runtime();
    assert_eq!(rt.get_var("missing"), None);
    assert_eq!(
        host_message(rt.get_var_as_int("missing").unwrap_err()),
        "variable 'missing' not found"
    );
    rt.set_var("s", "text");
    assert!(matches!(
        rt.get_var_as_int("s"),
        Err(ScriptError::Runtime(_))
    ));
    // Builtins are not variables.
    assert_eq!(rt.get_value("len"), None);
}

#[test]
fn registered_functions() {
    let rt = runtime();
    rt.register_func("double", None, |_ctx, _kwargs, args| {
        exact_args(&args, 1)?;
        Ok(Value::Int(args[0].as_int()? * 2))
    });
    rt.register_func("noop", Some("noop() - does nothing"), |_, _, _| Ok(Value::Null));

    assert_eq!(rt.eval("double(21)").unwrap(), Value::Int(42));
    assert_eq!(
        rt.eval("double.__doc__").unwrap(),
        Value::string("double(...) - User-defined function")
    );
    assert_eq!(
        rt.eval("noop.__doc__").unwrap(),
        Value::string("noop() - does nothing")
    );
    let err = rt.eval("double()").unwrap_err();
    assert_eq!(
        err.as_eval().unwrap().kind,
        sling_value::EvalErrorKind::Argument { want: 1, got: 0 }
    );
}

#[test]
fn host_functions_call_back_into_scripts() {
    let rt = runtime();
    rt.register_func("apply", None, |ctx, _kwargs, args| {
        exact_args(&args, 2)?;
        ctx.call(&args[0], vec![args[1].clone()], Kwargs::new())
    });
    let src = "
def square(x):
    return x * x
apply(square, 7)
";
    assert_eq!(rt.eval(src).unwrap(), Value::Int(49));
}

#[test]
fn script_functions() {
    let rt = runtime();
    rt.register_script_func("inc", "def inc(x, by=1):\n    return x + by\ninc")
        .unwrap();
    assert_eq!(rt.eval("inc(1, by=4)").unwrap(), Value::Int(5));

    rt.register_script_func("triple", "lambda x: x * 3").unwrap();
    assert_eq!(
        rt.call_function("triple", [2_i64], HashMap::new()).unwrap(),
        Value::Int(6)
    );

    let err = rt.register_script_func("bad", "42").unwrap_err();
    assert_eq!(host_message(err), "script must evaluate to a function, got int");
}

#[test]
fn call_function_with_kwargs_and_errors() {
    let rt = runtime();
    rt.eval("def greet(name, greeting='hello'):\n    return greeting + ', ' + name")
        .unwrap();
    let kwargs = HashMap::from([("greeting".to_string(), HostValue::from("hi"))]);
    assert_eq!(
        rt.call_function("greet", ["ann"], kwargs).unwrap(),
        Value::string("hi, ann")
    );
    assert_eq!(
        rt.call_function_host("greet", ["bo"], HashMap::new()).unwrap(),
        HostValue::String("hello, bo".to_string())
    );
    let ctx = ExecContext::background();
    let kwargs = HashMap::from([("greeting".to_string(), HostValue::from("hey"))]);
    assert_eq!(
        rt.call_function_host_with_context(&ctx, "greet", ["cy"], kwargs)
            .unwrap(),
        HostValue::String("hey, cy".to_string())
    );

    let err = rt
        .call_function("nope", Vec::<HostValue>::new(), HashMap::new())
        .unwrap_err();
    assert_eq!(host_message(err), "function 'nope' not found");

    rt.eval("def fail():\n    raise ValueError('bad input')").unwrap();
    let err = rt
        .call_function("fail", Vec::<HostValue>::new(), HashMap::new())
        .unwrap_err();
    let eval = err.as_eval().unwrap();
    assert_eq!(eval.exception_type(), "ValueError");
    assert_eq!(eval.message, "function 'fail': bad input");
}

#[test]
fn dotted_function_paths() {
    let rt = runtime();
    rt.import("functools").unwrap();
    let add = "def add(a, b):\n    return a + b\nadd";
    rt.register_script_func("add", add).unwrap();
    let add = rt.get_value("add").unwrap();
    let result = rt
        .call_function_values(
            "functools.reduce",
            vec![add, Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])],
            Kwargs::new(),
        )
        .unwrap();
    assert_eq!(result, Value::Int(6));

    let too_deep = vec!["a"; 11].join(".");
    let err = rt
        .call_function_values(&too_deep, Vec::new(), Kwargs::new())
        .unwrap_err();
    assert_eq!(host_message(err), format!("function '{too_deep}' not found"));
}

#[test]
fn instances_and_methods() {
    let rt = runtime();
    let src = "
class Counter:
    def __init__(self, start=0):
        self.value = start
    def increment(self, by=1):
        self.value += by
        return self.value

class Loud(Counter):
    def shout(self):
        return 'at ' + str(self.value)
";
    rt.eval(src).unwrap();

    let counter = rt
        .create_instance("Counter", vec![Value::Int(10)], Kwargs::new())
        .unwrap();
    assert_eq!(
        rt.call_method(&counter, "increment", Vec::new(), Kwargs::new())
            .unwrap(),
        Value::Int(11)
    );

    let loud = rt
        .create_instance("Loud", Vec::new(), Kwargs::new())
        .unwrap();
    rt.call_method(&loud, "increment", vec![Value::Int(5)], Kwargs::new())
        .unwrap();
    assert_eq!(
        rt.call_method(&loud, "shout", Vec::new(), Kwargs::new())
            .unwrap(),
        Value::string("at 5")
    );
}

#[test]
fn instance_and_method_errors() {
    let rt = runtime();
    rt.eval("class Empty:\n    pass\nnot_class = 3").unwrap();

    let err = rt
        .create_instance("Missing", Vec::new(), Kwargs::new())
        .unwrap_err();
    assert_eq!(host_message(err), "class 'Missing' not found");

    let err = rt
        .create_instance("not_class", Vec::new(), Kwargs::new())
        .unwrap_err();
    assert_eq!(host_message(err), "'not_class' is not a class, got int");

    let empty = rt
        .create_instance("Empty", Vec::new(), Kwargs::new())
        .unwrap();
    let err = rt
        .call_method(&empty, "run", Vec::new(), Kwargs::new())
        .unwrap_err();
    assert_eq!(host_message(err), "method 'run' not found in class 'Empty'");

    let err = rt
        .call_method(&Value::Int(1), "run", Vec::new(), Kwargs::new())
        .unwrap_err();
    assert_eq!(host_message(err), "object is not an instance, got int");
}

#[test]
fn host_libraries() {
    let rt = runtime();
    let lib = Library::builder("greetings")
        .description("Greeting helpers")
        .function("hello", "hello(name)", |_ctx, _kwargs, args| {
            exact_args(&args, 1)?;
            Ok(Value::string(format!("hello {}", args[0].as_string()?)))
        })
        .constant("PUNCT", "!")
        .build();
    rt.register_library(Arc::clone(&lib)).unwrap();
    rt.register_library(lib).unwrap();

    assert_eq!(
        rt.eval("import greetings\ngreetings.hello('ann') + greetings.PUNCT")
            .unwrap(),
        Value::string("hello ann!")
    );
    let names: Vec<(String, bool)> = rt
        .libraries()
        .into_iter()
        .filter(|info| info.name == "greetings")
        .map(|info| (info.name, info.imported))
        .collect();
    assert_eq!(names, vec![("greetings".to_string(), true)]);
}

#[test]
fn host_import_binds_globally() {
    let rt = runtime();
    rt.import_all(&["functools", "collections"]).unwrap();
    assert!(matches!(rt.get_value("functools"), Some(Value::Dict(_))));
    assert!(matches!(rt.get_value("collections"), Some(Value::Dict(_))));
    let err = rt.import("nope").unwrap_err();
    assert_eq!(err.as_eval().unwrap().exception_type(), "ModuleNotFoundError");
}

#[test]
fn stdlib_can_be_disabled() {
    let rt = Runtime::builder().capture_output().stdlib(false).build();
    let err = rt.eval("import functools").unwrap_err();
    assert_eq!(err.as_eval().unwrap().exception_type(), "ModuleNotFoundError");
    assert!(rt.libraries().is_empty());

    rt.register_library(crate::stdlib::functools()).unwrap();
    assert!(rt.eval("import functools").is_ok());
}

#[test]
fn script_libraries() {
    let rt = runtime();
    rt.register_script_library("mathx", "'Extra math.'\ndef sq(x):\n    return x * x\n")
        .unwrap();
    assert_eq!(
        rt.eval("import mathx\n[mathx.sq(4), mathx.__doc__]").unwrap(),
        Value::list(vec![Value::Int(16), Value::string("Extra math.")])
    );
}

#[test]
fn on_demand_libraries() {
    let rt = Runtime::builder()
        .capture_output()
        .on_demand_library_callback(|registry, name| {
            name == "lazy"
                && registry
                    .register_script_library("lazy", "VALUE = 7\n")
                    .is_ok()
        })
        .build();
    assert_eq!(rt.eval("import lazy\nlazy.VALUE").unwrap(), Value::Int(7));
    assert!(rt.eval("import other").is_err());

    rt.set_on_demand_library_callback(|registry, name| {
        registry
            .register_script_library(name, "VALUE = 'late'\n")
            .is_ok()
    });
    assert_eq!(
        rt.eval("import other\nother.VALUE").unwrap(),
        Value::string("late")
    );
}

#[test]
fn output_capture() {
    let rt = runtime();
    rt.eval("print('a', 1)\nprint('b', end='')").unwrap();
    assert_eq!(rt.output(), "a 1\nb");
    rt.clear_output();
    assert_eq!(rt.output(), "");

    let quiet = Runtime::builder().print_handler(crate::silent_handler()).build();
    quiet.eval("print('x')").unwrap();
    assert_eq!(quiet.output(), "");
}

#[test]
fn concurrent_evaluations_share_globals() {
    let rt = runtime();
    rt.eval("total = 0").unwrap();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let rt = rt.clone();
            std::thread::spawn(move || rt.eval(&format!("r{i} = {i} * 10\nr{i}")).unwrap())
        })
        .collect();
    let results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        vec![Value::Int(0), Value::Int(10), Value::Int(20), Value::Int(30)]
    );
    assert_eq!(rt.get_var("r3"), Some(HostValue::Int(30)));
}
