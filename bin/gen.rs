use clap::{Arg, Command};
use std::io::{self, Write};

const HEADER: &str = "product_SKU,comment_ID,comment_author,comment_author_email,\
comment_author_url,comment_author_IP,comment_date,comment_date_gmt,comment_content,\
comment_approved,comment_parent,user_id,rating,verified,title";

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .about("Write a sample review CSV to stdout")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("skus")
                .long("skus")
                .help("Number of distinct products referenced")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            Arg::new("bad_every")
                .long("bad-every")
                .help("Leave the SKU empty on every Nth row (0 = never)")
                .value_parser(clap::value_parser!(u64))
                .default_value("0"),
        )
        .get_matches();

    let rows: u64 = matches.get_one("rows").copied().unwrap_or(0);
    let skus: u64 = matches.get_one::<u64>("skus").copied().unwrap_or(10).max(1);
    let bad_every: u64 = matches.get_one("bad_every").copied().unwrap_or(0);

    let mut out = io::BufWriter::new(io::stdout().lock());
    writeln!(&mut out, "{HEADER}")?;

    // Deterministic data so runs are comparable.
    for i in 1..=rows {
        let sku = if bad_every > 0 && i % bad_every == 0 {
            String::new()
        } else {
            format!("SKU{:04}", i % skus)
        };
        let day = (i % 28) + 1;
        let hour = i % 24;
        writeln!(
            &mut out,
            "{sku},0,Reviewer {i},reviewer{i}@example.com,https://example.com/u/{i},10.0.{}.{},\
2024-03-{day:02} {hour:02}:15:00,2024-03-{day:02} {hour:02}:15:00,\
\"Review number {i}, line one.\nLine two.\",{},0,0,{},{},Title {i}",
            (i / 256) % 256,
            i % 256,
            if i % 5 == 0 { "0" } else { "1" },
            (i % 5) + 1,
            if i % 2 == 0 { "yes" } else { "no" },
        )?;
        if i % 10_000 == 0 {
            out.flush()?;
        }
    }

    out.flush()?;
    Ok(())
}
