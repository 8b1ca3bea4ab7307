/// A well formed chat stream as served by the research API.
pub fn sse_fixture() -> &'static str {
    return r#"
: keep-alive

data: {"type":"chunk","content":"Attention "}

data: {"type":"chunk","content":"is "}

event: message
data: {"type":"citation","paperId":"1","paperTitle":"Attention Is All You Need","section":"Sec 3"}

data: {"type":"chunk","content":"key."}

data: {"type":"citation","paperId":"doc-1","paperTitle":"Lecture Notes","relevanceSnippet":"scaled dot-product"}

data: [DONE]

data: {"type":"chunk","content":"never delivered"}
"#
    .trim_start();
}

/// A stream mixing valid events with lines the client must skip.
pub fn sse_malformed_fixture() -> &'static str {
    return r#"
data: {"type":"chunk","content":"Hello "}
data: {not json}
data: {"type":"unknown","content":"?"}
data: {"type":"chunk","content":"world"}
"#
    .trim_start();
}

/// A stream that fails part way through.
pub fn sse_error_fixture() -> &'static str {
    return r#"
data: {"type":"chunk","content":"Partial "}
data: {"type":"error","message":"Model overloaded"}
data: {"type":"chunk","content":"ignored"}
"#
    .trim_start();
}
