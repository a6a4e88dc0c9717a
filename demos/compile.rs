use tag_query::{CompileOptions, Compiler};

const EXPRESSIONS: [&str; 6] = [
    "tag1 and tag2",
    "tag1 or (tag2 and not tag3)",
    r#"*beach* and "golden hour" not fewer 3"#,
    "{^img_[0-9]+$} or exactly 1",
    "> 3 and < 2",
    "a or not a",
];

fn main() {
    let field = std::env::args().nth(1).unwrap_or_else(|| "tags".to_string());
    let compiler = Compiler::new(CompileOptions::default());

    for expression in EXPRESSIONS {
        match compiler.compile(expression, &field) {
            Ok(condition) => println!(r#""{expression}" => {condition}"#),
            Err(error) => println!(r#""{expression}" => error: {error}"#),
        }
    }
}
