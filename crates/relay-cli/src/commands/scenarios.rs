//! `relay scenarios`: List the built-in example requests.

use relay_core::scenarios;

use super::truncate;

pub fn table() -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<20} {:<30} {}\n", "KEY", "NAME", "REQUEST"));
    out.push_str(&format!("{}\n", "-".repeat(100)));
    for s in scenarios::all() {
        out.push_str(&format!("{:<20} {:<30} {}\n", s.key, s.name, truncate(s.request, 60)));
    }
    out
}

pub fn list(json: bool) -> Result<(), String> {
    if json {
        return super::print_json(&scenarios::all());
    }
    print!("{}", table());
    Ok(())
}
