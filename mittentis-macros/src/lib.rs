mod utils;

use proc_macro::{TokenStream, TokenTree};

/// Awaits several futures concurrently and yields their results as a
/// tuple, in argument order.
///
/// All futures are polled within the current task; none of them is
/// spawned onto another lane.
#[proc_macro]
pub fn join(input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);
    let count = args.len();

    if count == 0 {
        return "()".parse().unwrap();
    }

    if count == 1 {
        let expr = args[0]
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("");
        return format!("{{ {}.await }}", expr).parse().unwrap();
    }

    let mut output = String::new();
    output.push_str("{\n");

    for (i, expr_tokens) in args.iter().enumerate() {
        let idx = i + 1;
        let expr = utils::tokens_to_string(expr_tokens);
        output.push_str(&format!(
            "let mut __f{idx} = (::std::boxed::Box::pin({expr}), ::core::option::Option::None::<_>, false);\n"
        ));
    }

    output.push_str("::std::future::poll_fn(move |cx| {\n");
    output.push_str("    use ::std::task::Poll;\n");

    for i in 1..=count {
        output.push_str(&format!(
            "    if !__f{i}.2 {{\n\
                    if let Poll::Ready(val) = __f{i}.0.as_mut().poll(cx) {{\n\
                        __f{i}.1 = ::core::option::Option::Some(val);\n\
                        __f{i}.2 = true;\n\
                    }}\n\
                }}\n"
        ));
    }

    let all_done = (1..=count)
        .map(|i| format!("__f{i}.2"))
        .collect::<Vec<_>>()
        .join(" && ");

    output.push_str(&format!("    if {all_done} {{\n"));
    output.push_str("        Poll::Ready((\n");

    for i in 1..=count {
        output.push_str(&format!("            __f{i}.1.take().unwrap(),\n"));
    }

    output.push_str("        ))\n");
    output.push_str("    } else {\n");
    output.push_str("        Poll::Pending\n");
    output.push_str("    }\n");
    output.push_str("}).await\n");
    output.push_str("}\n");

    match output.parse::<TokenStream>() {
        Ok(ts) => ts,
        Err(err) => {
            let msg = format!("join macro error: {}", err);
            format!("compile_error!(\"{}\");", msg).parse().unwrap()
        }
    }
}

/// Marks the entry point of a mittentis application.
///
/// The annotated `async fn main` runs to completion on a freshly built
/// scheduler; the scheduler shuts down when it returns. Accepted
/// arguments:
///
/// - `compute_threads = N` sizes the compute lane,
/// - `io_max_threads = N` caps the elastic I/O lane,
/// - `context = "ui" | "io" | "compute"` picks the lane the body runs
///   on (default `compute`).
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let attr_str = attr.to_string();
    let mut compute_threads: Option<usize> = None;
    let mut io_max_threads: Option<usize> = None;
    let mut context = String::from("Compute");

    if !attr_str.is_empty() {
        for part in attr_str.split(',') {
            let part = part.trim();
            if let Some(v) = part.strip_prefix("compute_threads") {
                let v = v.trim_start_matches('=').trim();
                compute_threads = v.parse::<usize>().ok();
            } else if let Some(v) = part.strip_prefix("io_max_threads") {
                let v = v.trim_start_matches('=').trim();
                io_max_threads = v.parse::<usize>().ok();
            } else if let Some(v) = part.strip_prefix("context") {
                let v = v.trim_start_matches('=').trim().trim_matches('"');
                context = match v {
                    "ui" => String::from("Ui"),
                    "io" => String::from("Io"),
                    _ => String::from("Compute"),
                };
            }
        }
    }

    let Some(mut pos) = tokens.iter().rposition(
        |t| matches!(t, TokenTree::Group(g) if g.delimiter() == proc_macro::Delimiter::Brace),
    ) else {
        return TokenStream::new();
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let mut builder = String::from("::mittentis::RuntimeBuilder::new()");

    if let Some(n) = compute_threads {
        builder.push_str(&format!(".compute_threads({})", n));
    }

    if let Some(n) = io_max_threads {
        builder.push_str(&format!(".io_max_threads({})", n));
    }

    builder.push_str(".build()");

    if let Some(async_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(async_pos);
        if async_pos < pos {
            pos -= 1;
        }
    }

    let new_block = format!(
        "{{
            let runtime = {};
            runtime
                .block_on(::mittentis::Context::{}, async move {{
                    {}
                }})
        }}",
        builder, context, block
    );

    tokens[pos] = TokenTree::Group(proc_macro::Group::new(
        proc_macro::Delimiter::Brace,
        new_block.parse().unwrap(),
    ));

    tokens.into_iter().collect()
}

/// Marks an async test that runs on its own scheduler.
///
/// The test body runs to completion on the compute lane of a freshly
/// built scheduler, which is shut down when the body returns.
#[proc_macro_attribute]
pub fn test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens = item.into_iter().collect::<Vec<_>>();

    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }

    let block_pos = tokens.iter().rposition(
        |t| matches!(t, TokenTree::Group(g) if g.delimiter() == proc_macro::Delimiter::Brace),
    );

    let Some(pos) = block_pos else {
        return TokenStream::new();
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let new_block = format!(
        "{{
        let runtime = ::mittentis::RuntimeBuilder::new().build();
        runtime
            .block_on(::mittentis::Context::Compute, async move {{ {} }});
    }}",
        block
    );

    tokens[pos] = TokenTree::Group(proc_macro::Group::new(
        proc_macro::Delimiter::Brace,
        new_block.parse().unwrap(),
    ));

    let test_attr: TokenStream = "#[test]".parse().unwrap();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}
