//! Benchmarks for manifest parsing and generation.
//!
//! These benchmarks measure parsing `eng/Version.Details.xml`, generating
//! `eng/Version.Details.props` and flattening JSON documents of various
//! sizes.

use std::fmt::Write as _;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use darc_manifest::{flat_json, parser, props_generator};

const SMALL_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Dependencies>
  <Source Uri="https://github.com/dotnet/dotnet" Mapping="runtime" Sha="c0ffee" BarId="42" />
  <ProductDependencies>
    <Dependency Name="Microsoft.NETCore.App.Ref" Version="9.0.0-preview.1.24080.9">
      <Uri>https://github.com/dotnet/runtime</Uri>
      <Sha>abc123</Sha>
    </Dependency>
  </ProductDependencies>
  <ToolsetDependencies>
    <Dependency Name="Microsoft.DotNet.Arcade.Sdk" Version="9.0.0-beta.24112.1">
      <Uri>https://github.com/dotnet/arcade</Uri>
      <Sha>def456</Sha>
    </Dependency>
  </ToolsetDependencies>
</Dependencies>
"#;

const GLOBAL_JSON: &str = r#"{
  "sdk": { "version": "9.0.100-preview.1.24101.2", "allowPrerelease": true, "rollForward": "major" },
  "tools": { "dotnet": "9.0.100-preview.1.24101.2", "runtimes": { "dotnet": ["6.0.25", "8.0.1"] } },
  "msbuild-sdks": {
    "Microsoft.DotNet.Arcade.Sdk": "9.0.0-beta.24112.1",
    "Microsoft.DotNet.Helix.Sdk": "9.0.0-beta.24112.1",
    "Microsoft.Build.NoTargets": "3.7.0"
  }
}"#;

/// A manifest with `count` dependencies spread over ten repositories.
fn generate_manifest(count: usize) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Dependencies>\n  <ProductDependencies>\n");
    for i in 0..count {
        let _ = write!(
            out,
            "    <Dependency Name=\"Package.Number{i}\" Version=\"1.0.{i}\">\n      \
             <Uri>https://github.com/dotnet/repo{}</Uri>\n      \
             <Sha>{:040x}</Sha>\n    </Dependency>\n",
            i % 10,
            i
        );
    }
    out.push_str("  </ProductDependencies>\n</Dependencies>\n");
    out
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_details_parsing");

    group.bench_function("small", |b| {
        b.iter(|| parser::parse_str(black_box(SMALL_MANIFEST), true))
    });

    for count in [10, 100, 500] {
        let manifest = generate_manifest(count);
        group.bench_with_input(BenchmarkId::new("dependencies", count), &manifest, |b, manifest| {
            b.iter(|| parser::parse_str(black_box(manifest), true))
        });
    }

    group.finish();
}

fn bench_props_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("props_generation");

    for count in [10, 100, 500] {
        let details = match parser::parse_str(&generate_manifest(count), true) {
            Ok(details) => details,
            Err(e) => panic!("generated manifest does not parse: {}", e),
        };
        group.bench_with_input(BenchmarkId::new("render", count), &details, |b, details| {
            b.iter(|| props_generator::render(black_box(details)))
        });
        group.bench_with_input(BenchmarkId::new("generate", count), &details, |b, details| {
            b.iter(|| props_generator::generate(black_box(details)))
        });
    }

    group.finish();
}

fn bench_flat_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_json");

    group.bench_function("flatten_global_json", |b| {
        b.iter(|| flat_json::flatten(black_box(GLOBAL_JSON)))
    });

    let old = flat_json::flatten(GLOBAL_JSON).unwrap_or_default();
    let new = flat_json::flatten(&GLOBAL_JSON.replace("24112.1", "24115.3")).unwrap_or_default();
    group.bench_function("compare_global_json", |b| {
        b.iter(|| flat_json::compare(black_box(&old), black_box(&new)))
    });

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_props_generation, bench_flat_json);
criterion_main!(benches);
