//! `certlab inspect`

use std::path::Path;

use certlab_store::load_instance_file;
use miette::{Context, IntoDiagnostic};

pub(crate) fn run_inspect_command(path: &Path) -> miette::Result<()> {
    let instance = load_instance_file(path)
        .into_diagnostic()
        .wrap_err("Instance failed validation")?;
    println!("id:             {}", instance.id);
    println!("format_version: {}", instance.format_version);
    println!("seed/index:     {}/{}", instance.seed, instance.index);
    println!("created_at:     {}", instance.created_at);
    println!(
        "generator:      {} {} (model {})",
        instance.generator.tool, instance.generator.version, instance.generator.model
    );
    for (name, value) in &instance.generator.parameters {
        println!("  {name} = {value}");
    }
    println!("payload:        {}", instance.payload.kind());
    if let Some(graph) = instance.graph() {
        println!("  vertices = {}", graph.vertices);
        println!("  edges    = {}", graph.edge_count());
    }
    println!("payload_sha256: {} (verified)", instance.payload_sha256);
    Ok(())
}
