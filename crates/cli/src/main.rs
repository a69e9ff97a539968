mod exit_codes;
mod logging;
mod plain;
mod tui;
mod util;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use stockgrid_api_client::{ApiError, CatalogClient};
use stockgrid_config::{Settings, SettingsOverrides};
use stockgrid_core::format::parse_for_column;
use stockgrid_core::record::FieldNaming;
use stockgrid_core::{
    catalog_columns, format_value, normalize, CatalogQuery, FieldUpdate, Grid, PageRequest,
    ProductField, ProductRecord, SearchField, SearchMode, SortDirection,
};

use exit_codes::*;

#[derive(Parser)]
#[command(name = "stockgrid")]
#[command(about = "Editable product catalog grid for the inventory API")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Catalog API base URL (overrides api.baseUrl)
    #[arg(long, global = true, env = "STOCKGRID_API_URL")]
    api_url: Option<String>,

    /// Records per page (overrides grid.pageSize)
    #[arg(long, global = true)]
    page_size: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
struct SearchArgs {
    /// Search term (omit to list the whole catalog)
    #[arg(long, short = 's')]
    search: Option<String>,

    /// Field to search: id, descricao, fornecedor_id
    #[arg(long, default_value = "descricao", value_parser = parse_search_field)]
    field: SearchField,

    /// Match mode: exato, contém, maior_igual, começa_com
    #[arg(long, default_value = "contém", value_parser = parse_search_mode)]
    mode: SearchMode,

    /// Sort by item code: asc or desc (default from settings)
    #[arg(long, value_parser = parse_sort)]
    sort: Option<SortDirection>,
}

impl SearchArgs {
    fn query(&self) -> CatalogQuery {
        match &self.search {
            Some(term) => CatalogQuery::search(term, self.field, self.mode),
            None => CatalogQuery::All,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Open the grid editor (default)
    #[command(after_help = "\
Examples:
  stockgrid
  stockgrid browse --search PARAFUSO --mode começa_com
  stockgrid --api-url http://estoque.local:5000 browse --sort desc")]
    Browse {
        #[command(flatten)]
        search: SearchArgs,
    },

    /// Print one page of the catalog
    #[command(after_help = "\
Examples:
  stockgrid list
  stockgrid list --page 3 --limit 20
  stockgrid list --search 42 --field fornecedor_id --mode exato --json")]
    List {
        #[command(flatten)]
        search: SearchArgs,

        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Records per page (default from settings)
        #[arg(long)]
        limit: Option<u32>,

        /// Output normalized JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one product
    Get {
        /// Item code
        id: String,

        /// Output normalized JSON
        #[arg(long)]
        json: bool,
    },

    /// Change one field of a product
    #[command(after_help = "\
Examples:
  stockgrid set 1001 loja3 12
  stockgrid set 1001 venda1 1.234,50
  stockgrid set 1001 descricao 'PARAFUSO SEXTAVADO 3/8'")]
    Set {
        /// Item code
        id: String,

        /// Field name (descricao, fornecedor_id, ativo, loja1..loja15,
        /// custo_final, venda1..venda4, or the backend spelling)
        field: String,

        /// New value; decimals accept either `,` or `.`
        value: String,
    },

    /// Show the settings file path and effective settings
    Config,
}

fn parse_search_field(s: &str) -> Result<SearchField, String> {
    SearchField::parse(s).ok_or_else(|| format!("unknown search field '{}' (id, descricao, fornecedor_id)", s))
}

fn parse_search_mode(s: &str) -> Result<SearchMode, String> {
    SearchMode::parse(s)
        .ok_or_else(|| format!("unknown search mode '{}' (exato, contém, maior_igual, começa_com)", s))
}

fn parse_sort(s: &str) -> Result<SortDirection, String> {
    SortDirection::parse(s).ok_or_else(|| format!("unknown sort '{}' (asc, desc)", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = Settings::load().with_overrides(SettingsOverrides {
        api_url: cli.api_url.clone(),
        page_size: cli.page_size,
    });
    if let Err(e) = logging::init(&settings.log_path(), &settings.log_filter) {
        eprintln!("warning: logging disabled: {}", e);
    }
    log::info!("stockgrid {} against {}", env!("CARGO_PKG_VERSION"), settings.api_base_url);

    let command = cli.command.unwrap_or(Commands::Browse { search: SearchArgs::default() });
    let result = match command {
        Commands::Browse { search } => cmd_browse(&settings, search),
        Commands::List { search, page, limit, json } => cmd_list(&settings, search, page, limit, json),
        Commands::Get { id, json } => cmd_get(&settings, &id, json),
        Commands::Set { id, field, value } => cmd_set(&settings, &id, &field, &value),
        Commands::Config => cmd_config(&settings),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            log::error!("{}", message);
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from an API error with the matching exit code.
    pub fn api(err: ApiError, api_base: &str) -> Self {
        let code = api_exit_code(&err);
        let hint = match &err {
            ApiError::Network(_) => Some(format!(
                "is the catalog API running at {}? set --api-url or STOCKGRID_API_URL",
                api_base
            )),
            ApiError::Parse(_) => Some("the server answered, but not with catalog JSON; check the URL".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn client(settings: &Settings) -> Result<CatalogClient, CliError> {
    CatalogClient::new(&settings.api_base_url, settings.api_timeout())
        .map_err(|e| CliError::api(e, &settings.api_base_url))
}

fn write_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    let mut out = io::stdout().lock();
    writeln!(out, "{}", text).map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// browse
// ============================================================================

fn cmd_browse(settings: &Settings, search: SearchArgs) -> Result<(), CliError> {
    let client = client(settings)?;
    let mut config = settings.grid_config();
    if let Some(sort) = search.sort {
        config.sort = sort;
    }
    tui::run(Grid::new(config), client, search.query()).map_err(CliError::io)
}

// ============================================================================
// list / get
// ============================================================================

fn cmd_list(
    settings: &Settings,
    search: SearchArgs,
    page: u32,
    limit: Option<u32>,
    json: bool,
) -> Result<(), CliError> {
    if page == 0 {
        return Err(CliError::args("--page starts at 1"));
    }
    let request = PageRequest {
        query: search.query(),
        page,
        limit: limit.unwrap_or(settings.page_size).clamp(1, 500),
        sort: search.sort.unwrap_or(settings.sort),
    };

    let client = client(settings)?;
    let response = client
        .fetch_page(&request)
        .map_err(|e| CliError::api(e, client.api_base()))?;
    let has_more = response.has_more(request.limit);

    let records: Vec<ProductRecord> = response
        .items
        .iter()
        .map(normalize)
        .filter(|r| !r.item_id.is_empty())
        .collect();

    if json {
        return write_json(&json!({
            "items": records.iter().map(|r| r.to_json(FieldNaming::Client)).collect::<Vec<_>>(),
            "pagination": response.pagination,
            "hasMore": has_more,
        }));
    }

    plain::print_table(&mut io::stdout().lock(), &catalog_columns(), &records)
        .map_err(|e| CliError::io(e.to_string()))?;

    let total = response
        .total_items()
        .map(|t| format!(" of {}", t))
        .unwrap_or_default();
    eprintln!(
        "page {}: {} records{}{}",
        page,
        records.len(),
        total,
        if has_more { format!(" (next: --page {})", page + 1) } else { String::new() }
    );
    Ok(())
}

fn cmd_get(settings: &Settings, id: &str, json: bool) -> Result<(), CliError> {
    let client = client(settings)?;
    let raw = client
        .fetch_product(id)
        .map_err(|e| CliError::api(e, client.api_base()))?;
    let record = normalize(&raw);

    if json {
        return write_json(&record.to_json(FieldNaming::Client));
    }
    plain::print_record(&mut io::stdout().lock(), &catalog_columns(), &record)
        .map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// set
// ============================================================================

fn cmd_set(settings: &Settings, id: &str, field_name: &str, input: &str) -> Result<(), CliError> {
    let field = ProductField::parse(field_name).ok_or_else(|| {
        CliError::args(format!("unknown field '{}'", field_name))
            .with_hint("fields: descricao, fornecedor_id, ativo, loja1..loja15, custo_final, venda1..venda4")
    })?;

    let columns = catalog_columns();
    let column = columns
        .iter()
        .find(|c| c.field == field)
        .filter(|c| c.editable)
        .ok_or_else(|| CliError::args(format!("'{}' cannot be changed", field_name)))?;

    let parsed = parse_for_column(input, column)
        .map_err(|e| CliError::args(format!("{}: {}", column.header, e)))?;

    // Store it the way the grid would (status upper-cased, stock truncated)
    let mut scratch = ProductRecord::default();
    scratch.set(field, parsed);
    let update = FieldUpdate { field, value: scratch.get(field) };

    let client = client(settings)?;
    client
        .update_product(id, &update.body())
        .map_err(|e| CliError::api(e, client.api_base()))?;
    log::info!("set {}.{} = {}", id, field, update.value);

    println!("{} {} = {}", id, column.header, format_value(&update.value, column));
    Ok(())
}

// ============================================================================
// config
// ============================================================================

fn cmd_config(settings: &Settings) -> Result<(), CliError> {
    println!("settings: {}", Settings::config_path_display());
    println!("log:      {}", settings.log_path().display());
    let text = serde_json::to_string_pretty(settings).map_err(|e| CliError::io(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_is_browse() {
        let cli = Cli::try_parse_from(["stockgrid"]).unwrap();
        assert!(cli.command.is_none());
        assert!(SearchArgs::default().query() == CatalogQuery::All);
    }

    #[test]
    fn test_list_args() {
        let cli = Cli::try_parse_from([
            "stockgrid", "list", "--search", "42", "--field", "fornecedor_id", "--mode", "exato",
            "--sort", "desc", "--page", "2",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::List { search, page, .. }) => {
                assert_eq!(page, 2);
                assert_eq!(search.sort, Some(SortDirection::Desc));
                assert_eq!(
                    search.query(),
                    CatalogQuery::search("42", SearchField::SupplierId, SearchMode::Exact)
                );
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_bad_mode_rejected() {
        assert!(Cli::try_parse_from(["stockgrid", "list", "--mode", "fuzzy"]).is_err());
    }

    #[test]
    fn test_api_error_hint() {
        let err = CliError::api(ApiError::Network("refused".into()), "http://localhost:5000");
        assert_eq!(err.code, EXIT_API_NETWORK);
        assert!(err.hint.unwrap().contains("http://localhost:5000"));

        let err = CliError::api(ApiError::NotFound("Produto não encontrado".into()), "x");
        assert_eq!(err.code, EXIT_API_NOT_FOUND);
        assert_eq!(err.message, "Produto não encontrado");
    }
}
