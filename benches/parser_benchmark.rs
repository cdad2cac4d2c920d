//! Benchmarks for request parsing, variable substitution and the notebook
//! file format.

use api_notebook::notebook::{convert_text_to_notebook, deserialize, serialize, CellLanguage, NotebookDocument};
use api_notebook::parser::parse_request;
use api_notebook::variables::{substitute_variables, VariableContext};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Map, Value};

/// Generate a request with the given number of templated headers.
fn generate_request(num_headers: usize) -> String {
    let mut request = String::from(
        "# Create a resource\nPOST {{baseUrl}}/api/v1/users/{{userId}}/items\n\
         Authorization: Bearer {{authToken}}\nContent-Type: application/json\n",
    );
    for i in 0..num_headers {
        request.push_str(&format!("X-Custom-Header-{}: {{{{var_{}}}}}  # header {}\n", i, i % 100, i));
    }
    request.push_str("\n{\n  \"name\": \"{{name}}\",\n  \"tags\": [\"a\", \"b\"]\n}\n");
    request
}

fn generate_variables(num_vars: usize) -> Map<String, Value> {
    let mut variables = Map::new();
    for i in 0..num_vars {
        variables.insert(format!("var_{}", i), json!(format!("value_{}", i)));
    }
    variables.insert("baseUrl".to_string(), json!("https://api.example.com"));
    variables.insert("authToken".to_string(), json!("bearer_token_12345"));
    variables.insert("userId".to_string(), json!(123));
    variables.insert("name".to_string(), json!("Jo"));
    variables
}

/// Generate plain request text with the given number of sections.
fn generate_http_file(num_requests: usize) -> String {
    let mut content = String::new();
    for i in 0..num_requests {
        let method = match i % 4 {
            0 => "GET",
            1 => "POST",
            2 => "PUT",
            _ => "DELETE",
        };
        content.push_str(&format!(
            "## Request {}\n\n{} https://api.example.com/resource/{}\nAccept: application/json\n",
            i, method, i
        ));
        if matches!(method, "POST" | "PUT") {
            content.push_str(&format!("Content-Type: application/json\n\n{{\"id\": {}}}\n", i));
        }
        content.push_str("\n###\n\n");
    }
    content
}

fn bench_parse_request(c: &mut Criterion) {
    let variables = VariableContext::from_map(generate_variables(100));
    let mut group = c.benchmark_group("parse_request");

    for size in [0, 10, 100].iter() {
        let request = generate_request(*size);
        group.throughput(Throughput::Elements(*size as u64 + 2));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}_headers", size)), size, |b, _| {
            b.iter(|| parse_request(black_box(&request), black_box(&variables)).unwrap())
        });
    }

    group.finish();
}

fn bench_substitute(c: &mut Criterion) {
    let request = generate_request(50);

    c.bench_function("substitute_no_placeholders", |b| {
        let variables = generate_variables(10);
        b.iter(|| substitute_variables(black_box("GET https://api.example.com/users"), black_box(&variables)))
    });

    let mut group = c.benchmark_group("substitute_variables");

    for size in [10, 100, 1000].iter() {
        let variables = generate_variables(*size);
        group.bench_with_input(BenchmarkId::from_parameter(format!("{}_variables", size)), size, |b, _| {
            b.iter(|| substitute_variables(black_box(&request), black_box(&variables)))
        });
    }

    group.finish();
}

fn bench_notebook_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("notebook_format");
    group.sample_size(20);

    for size in [10, 100, 1000].iter() {
        let text = generate_http_file(*size);
        let cells = convert_text_to_notebook(&text, CellLanguage::Markdown);
        let bytes = serialize(&NotebookDocument::new(cells));

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("convert_text", size), size, |b, _| {
            b.iter(|| convert_text_to_notebook(black_box(&text), CellLanguage::Markdown))
        });
        group.bench_with_input(BenchmarkId::new("deserialize", size), size, |b, _| {
            b.iter(|| deserialize(black_box(&bytes)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_request, bench_substitute, bench_notebook_format);
criterion_main!(benches);
