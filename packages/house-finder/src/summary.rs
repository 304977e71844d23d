//! Terminal summary printed at the end of a run.

use colored::Colorize;
use listing_eval::{Listing, RunCounts};

const WIDTH: usize = 80;

pub fn print_summary(listings: &[Listing], counts: &RunCounts) {
    let rule = "=".repeat(WIDTH);
    let thin = "-".repeat(WIDTH);

    println!("\n{rule}");
    println!("{}", "HOUSE FINDER RESULTS".bold());
    println!("{rule}");
    println!("  Listings found:   {}", counts.listings_found);
    println!("  Listings scored:  {}", counts.listings_scored);
    println!("  Listings passed:  {}", counts.listings_passed);
    println!("{thin}");

    if listings.is_empty() {
        println!("  No listings to display.");
        println!("{rule}");
        return;
    }

    let header = format!("{:<35} {:>6} {:>5} {:>10}", "Address", "Score", "Pass", "Price");
    println!("  {}", header.bold());
    println!("{thin}");
    for listing in listings {
        let row = SummaryRow::from(listing);
        let pass = if row.pass {
            format!("{:>5}", "YES").green()
        } else {
            format!("{:>5}", "NO").red()
        };
        println!(
            "  {:<35} {:>6} {} {:>10}",
            row.address, row.score, pass, row.price
        );
    }
    println!("{rule}");
}

/// One table row, uncoloured.
#[derive(Debug, PartialEq)]
struct SummaryRow {
    address: String,
    score: String,
    pass: bool,
    price: String,
}

impl From<&Listing> for SummaryRow {
    fn from(listing: &Listing) -> Self {
        Self {
            address: listing
                .address
                .as_deref()
                .unwrap_or("Unknown")
                .chars()
                .take(34)
                .collect(),
            score: match listing.avg_score {
                Some(avg) if avg != 0.0 => format!("{avg:.1}"),
                _ => "N/A".to_string(),
            },
            pass: listing.listing_pass.unwrap_or(0) != 0,
            price: match listing.price {
                Some(price) if price != 0 => format_price(price),
                _ => "N/A".to_string(),
            },
        }
    }
}

/// `$2,450`
fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if price < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
