//! `relay agents`: Show the agent catalog.

use relay_core::AgentCatalog;

use super::load_catalog;

pub fn table(catalog: &AgentCatalog) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<12} {:<20} {:<10} {}\n",
        "ROLE", "NAME", "KNOWLEDGE", "DELEGATES TO"
    ));
    out.push_str(&format!("{}\n", "-".repeat(72)));
    for def in catalog.all() {
        let delegates: Vec<&str> = def.can_delegate_to.iter().map(|r| r.as_str()).collect();
        out.push_str(&format!(
            "{:<12} {:<20} {:<10} {}\n",
            def.role.as_str(),
            def.name,
            if def.can_query_knowledge { "yes" } else { "no" },
            if delegates.is_empty() { "-".to_string() } else { delegates.join(", ") }
        ));
    }
    out
}

pub fn list(agents_dir: Option<&str>, json: bool) -> Result<(), String> {
    let catalog = load_catalog(agents_dir)?;
    if json {
        return super::print_json(&catalog.all());
    }
    print!("{}", table(&catalog));
    Ok(())
}
