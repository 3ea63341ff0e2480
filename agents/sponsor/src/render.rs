use serde::Serialize;

use sponsor_base::InstanceDisplay;
use sponsor_core::{InstanceListEntry, SponsorError, SponsorResult};

#[derive(Serialize)]
struct ListingRow<'a> {
    index: u64,
    address: String,
    link: &'a str,
}

fn print_json(value: &impl Serialize) -> SponsorResult<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| SponsorError::InvalidConfiguration(e.to_string()))?;
    println!("{out}");
    Ok(())
}

pub fn listing(entries: &[InstanceListEntry], json: bool) -> SponsorResult<()> {
    let links: Vec<String> = entries.iter().map(InstanceListEntry::link).collect();
    if json {
        let rows: Vec<_> = entries
            .iter()
            .zip(&links)
            .map(|(entry, link)| ListingRow {
                index: entry.index,
                address: format!("{:?}", entry.address),
                link,
            })
            .collect();
        return print_json(&rows);
    }
    if entries.is_empty() {
        println!("No pools registered");
    }
    for (entry, link) in entries.iter().zip(&links) {
        println!("{:>4}  {:?}  {link}", entry.index, entry.address);
    }
    Ok(())
}

pub fn instance(display: &InstanceDisplay, json: bool) -> SponsorResult<()> {
    if json {
        return print_json(display);
    }
    for (field, value) in display.rows() {
        println!("{:<14} {value}", format!("{field}:"));
    }
    Ok(())
}
