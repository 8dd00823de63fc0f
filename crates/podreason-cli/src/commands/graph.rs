use anyhow::Result;
use podreason_common::DeliveryType;
use podreason_core::{ModuleRegistry, topology};

/// One line per module in topological order: `rank. name <- parents`
pub fn render_graph(delivery_type: DeliveryType) -> Result<String> {
    let registry = ModuleRegistry::builtin();
    let graph = topology::for_delivery(&registry, delivery_type)?;

    let mut lines = vec![format!("{} ({} modules, root {})", delivery_type, graph.len(), graph.root())];
    for (rank, module) in graph.modules().iter().enumerate() {
        let parents = module.parent_names();
        if parents.is_empty() {
            lines.push(format!("{:>2}. {}", rank, module.name()));
        } else {
            lines.push(format!("{:>2}. {} <- {}", rank, module.name(), parents.join(", ")));
        }
    }
    Ok(lines.join("\n"))
}

pub fn show_graph(delivery_type: DeliveryType) -> Result<()> {
    println!("{}", render_graph(delivery_type)?);
    Ok(())
}
