//! corp-loader: Build the company directory from a DART corp code export.
//!
//! Reads the `corp_codes.json` list (corp_code, corp_name, stock_code,
//! modify_date) and replaces the `companies` table with it. With
//! `--download` the list is fetched from DART's `corpCode.xml` archive
//! first and written back to the JSON path.
//!
//! Usage:
//!   cargo run -p corp-loader
//!   cargo run -p corp-loader -- --download
//!   cargo run -p corp-loader -- --json data/corp_codes.json --db sqlite:corp_codes.db
//!   cargo run -p corp-loader -- --search 삼성

use anyhow::Context;
use company_directory::{CompanyDirectory, CorpRecord, DEFAULT_SEARCH_LIMIT};
use dart_client::{CorpCode, DartClient};

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn to_record(code: CorpCode) -> CorpRecord {
    CorpRecord {
        corp_code: code.corp_code,
        corp_name: code.corp_name,
        stock_code: code.stock_code,
        modify_date: code.modify_date,
    }
}

/// Fetch the corp code list from DART, save it as JSON and load it.
async fn download(directory: &CompanyDirectory, json_path: &str) -> anyhow::Result<u64> {
    let api_key = std::env::var("OPEN_DART_API_KEY")
        .context("OPEN_DART_API_KEY must be set to download corp codes")?;

    let codes = DartClient::new(api_key)
        .download_corp_codes()
        .await
        .context("Failed to download corp codes from DART")?;
    let records: Vec<CorpRecord> = codes.into_iter().map(to_record).collect();

    let json = serde_json::to_string_pretty(&records)?;
    tokio::fs::write(json_path, json)
        .await
        .with_context(|| format!("Failed to write {}", json_path))?;
    tracing::info!("Saved {} corp codes to {}", records.len(), json_path);

    directory.rebuild_from_records(&records).await
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "corp_loader=info,company_directory=info".into())
    };
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage:");
        eprintln!("  corp-loader                      Rebuild the directory from corp_codes.json");
        eprintln!("  corp-loader --download           Fetch corpCode.xml from DART, save JSON, rebuild");
        eprintln!("  corp-loader --search NAME        Search the existing directory");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --json PATH    Corp code list (default: $CORP_CODES_JSON or corp_codes.json)");
        eprintln!("  --db URL       SQLite URL (default: $DATABASE_URL or sqlite:corp_codes.db)");
        eprintln!("  --limit N      Max search results (default: {})", DEFAULT_SEARCH_LIMIT);
        return Ok(());
    }

    let env_db = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:corp_codes.db".to_string());
    let db_url = arg_value(&args, "--db").unwrap_or(&env_db);

    let directory = CompanyDirectory::new(db_url).await?;

    if let Some(query) = arg_value(&args, "--search") {
        let limit: i64 = arg_value(&args, "--limit")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SEARCH_LIMIT);

        let companies = directory.search(query, limit).await?;
        if companies.is_empty() {
            println!("'{}'에 해당하는 회사를 찾을 수 없습니다.", query);
        }
        for company in companies {
            println!(
                "{}\t{}\t{}",
                company.corp_code,
                company.corp_name,
                company.stock_code.as_deref().unwrap_or("")
            );
        }
        return Ok(());
    }

    let env_json = std::env::var("CORP_CODES_JSON").unwrap_or_else(|_| "corp_codes.json".to_string());
    let json_path = arg_value(&args, "--json").unwrap_or(&env_json);

    tracing::info!("corp-loader: json={}, db={}", json_path, db_url);

    let stored = if args.iter().any(|a| a == "--download") {
        download(&directory, json_path).await?
    } else {
        directory
            .rebuild_from_json(json_path)
            .await
            .with_context(|| format!("Failed to rebuild company directory from {}", json_path))?
    };

    tracing::info!("Done: {} companies stored in {}", stored, db_url);
    Ok(())
}
