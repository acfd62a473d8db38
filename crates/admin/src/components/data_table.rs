//! Reusable data table: configuration plus the sort/filter/paginate engine.
//!
//! A table runs in one of two modes:
//!
//! - **Client** - the handler loads every row and [`apply`] filters, sorts and
//!   slices them according to the request's [`TableQuery`].
//! - **Server** - the handler already fetched exactly one page (the database
//!   did the paging) and [`server_page`] only computes the [`PageInfo`].
//!
//! Table state lives in the query string (`q`, `sort`, `dir`, `page`,
//! `per_page`, `f_<key>`, `hide`) so every view is linkable and works without
//! JavaScript.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Page sizes offered by the page-size picker.
pub const PAGE_SIZES: [u32; 7] = [10, 20, 25, 30, 40, 50, 100];

/// Rows per page when none (or an unsupported value) is requested.
pub const DEFAULT_PER_PAGE: u32 = 10;

// =============================================================================
// Configuration
// =============================================================================

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Unique key for the column (also the [`Tabular::cell`] key).
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Whether the column is sortable.
    pub sortable: bool,
    /// Right-align the column (numbers, prices).
    pub numeric: bool,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub fn sortable(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: true,
            numeric: false,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: false,
            numeric: false,
        }
    }

    /// Mark the column as numeric.
    #[must_use]
    pub const fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }
}

/// Filter type for data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Free text, matched as a case-insensitive substring.
    Text,
    /// Dropdown, matched exactly (ignoring case).
    Select,
}

/// Option for select filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Per-column filter definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFilter {
    /// Column key the filter applies to.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Filter type.
    pub filter_type: FilterType,
    /// Placeholder text (for text inputs).
    pub placeholder: Option<String>,
    /// Available options (for selects).
    pub options: Vec<FilterOption>,
}

impl TableFilter {
    /// Create a text filter.
    #[must_use]
    pub fn text(key: &str, label: &str, placeholder: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Text,
            placeholder: Some(placeholder.to_string()),
            options: vec![],
        }
    }

    /// Create a select filter.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Select,
            placeholder: None,
            options,
        }
    }

    /// Query-string parameter name (`f_<key>`).
    #[must_use]
    pub fn param(&self) -> String {
        format!("f_{}", self.key)
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Page the table lives on; links are built against it.
    pub base_path: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Filter definitions.
    pub filters: Vec<TableFilter>,
    /// Whether the global search box is shown.
    pub searchable: bool,
    /// Search placeholder text.
    pub search_placeholder: String,
    /// Icon for empty state.
    pub empty_icon: String,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
    /// Whether to show filter panel.
    pub has_filters: bool,
    /// Whether to show column picker.
    pub has_column_picker: bool,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str, base_path: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            base_path: base_path.to_string(),
            columns: vec![],
            filters: vec![],
            searchable: true,
            search_placeholder: "Search...".to_string(),
            empty_icon: "ph-list".to_string(),
            empty_title: "No results.".to_string(),
            empty_description: None,
            has_filters: false,
            has_column_picker: true,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.has_filters = true;
        self.filters.push(filter);
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Hide the global search box (server-paged tables).
    #[must_use]
    pub const fn without_search(mut self) -> Self {
        self.searchable = false;
        self
    }

    /// Set empty state configuration.
    #[must_use]
    pub fn empty_state(mut self, icon: &str, title: &str, description: Option<&str>) -> Self {
        self.empty_icon = icon.to_string();
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    /// Look up a column by key.
    #[must_use]
    pub fn find_column(&self, key: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Columns not hidden by `query`, in configured order.
    #[must_use]
    pub fn visible_columns(&self, query: &TableQuery) -> Vec<&TableColumn> {
        self.columns
            .iter()
            .filter(|c| !query.hidden.contains(&c.key))
            .collect()
    }
}

/// Local users table (client mode, editable).
#[must_use]
pub fn users_table_config() -> DataTableConfig {
    DataTableConfig::new("local-users", "/admin/local-users")
        .column(TableColumn::sortable("firstName", "First Name"))
        .column(TableColumn::sortable("lastName", "Last Name"))
        .column(TableColumn::sortable("age", "Age").numeric())
        .column(TableColumn::sortable("gender", "Gender"))
        .column(TableColumn::sortable("email", "Email"))
        .column(TableColumn::new("phone", "Phone"))
        .column(TableColumn::sortable("dateOfBirth", "Date of Birth"))
        .filter(gender_filter())
        .filter(TableFilter::text("email", "Email", "Filter emails..."))
        .search_placeholder("Search users...")
        .empty_state(
            "ph-users",
            "No users yet",
            Some("Add a user or adjust your search and filters"),
        )
}

/// Demo API users table (client mode, read-only).
#[must_use]
pub fn demo_users_table_config() -> DataTableConfig {
    DataTableConfig::new("api-users", "/admin/api-users")
        .column(TableColumn::sortable("id", "ID").numeric())
        .column(TableColumn::sortable("firstName", "First Name"))
        .column(TableColumn::sortable("lastName", "Last Name"))
        .column(TableColumn::sortable("age", "Age").numeric())
        .column(TableColumn::sortable("gender", "Gender"))
        .column(TableColumn::sortable("email", "Email"))
        .column(TableColumn::new("phone", "Phone"))
        .column(TableColumn::sortable("dateOfBirth", "Date of Birth"))
        .filter(gender_filter())
        .search_placeholder("Search API users...")
        .empty_state("ph-cloud-slash", "No API users", None)
}

/// Products table (server mode, paged by the database).
#[must_use]
pub fn products_table_config() -> DataTableConfig {
    DataTableConfig::new("api-products", "/admin/api-products")
        .column(TableColumn::new("image", "Image"))
        .column(TableColumn::new("title", "Title"))
        .column(TableColumn::new("category", "Category"))
        .column(TableColumn::new("price", "Price").numeric())
        .column(TableColumn::new("discountPercentage", "Discount").numeric())
        .column(TableColumn::new("finalPrice", "Final Price").numeric())
        .column(TableColumn::new("stock", "Stock").numeric())
        .without_search()
        .empty_state(
            "ph-package",
            "No products",
            Some("Add a product or populate from the demo API"),
        )
}

fn gender_filter() -> TableFilter {
    TableFilter::select(
        "gender",
        "Gender",
        vec![
            FilterOption::new("male", "Male"),
            FilterOption::new("female", "Female"),
            FilterOption::new("other", "Other"),
        ],
    )
}

// =============================================================================
// Table State (query string)
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Table state parsed from the request query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    /// Global filter text.
    pub q: String,
    /// Sorted column key.
    pub sort: Option<String>,
    pub dir: SortDirection,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
    /// Column key to filter value.
    pub filters: BTreeMap<String, String>,
    /// Hidden column keys.
    pub hidden: BTreeSet<String>,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            sort: None,
            dir: SortDirection::Asc,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            filters: BTreeMap::new(),
            hidden: BTreeSet::new(),
        }
    }
}

impl TableQuery {
    /// Parse raw query pairs, dropping anything `config` does not know about.
    ///
    /// Unknown or non-sortable sort keys are ignored, `per_page` falls back to
    /// [`DEFAULT_PER_PAGE`] unless it is one of [`PAGE_SIZES`], and `page`
    /// is at least 1.
    #[must_use]
    pub fn from_pairs(config: &DataTableConfig, pairs: &[(String, String)]) -> Self {
        let mut query = Self::default();

        for (key, value) in pairs {
            let value = value.trim();
            match key.as_str() {
                "q" => value.clone_into(&mut query.q),
                "sort" => {
                    query.sort = config
                        .find_column(value)
                        .filter(|c| c.sortable)
                        .map(|c| c.key.clone());
                }
                "dir" => {
                    query.dir = if value.eq_ignore_ascii_case("desc") {
                        SortDirection::Desc
                    } else {
                        SortDirection::Asc
                    };
                }
                "page" => query.page = value.parse::<u32>().unwrap_or(1).max(1),
                "per_page" => {
                    query.per_page = value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| PAGE_SIZES.contains(n))
                        .unwrap_or(DEFAULT_PER_PAGE);
                }
                "hide" => {
                    for col in value.split(',').map(str::trim) {
                        if config.find_column(col).is_some() {
                            query.hidden.insert(col.to_string());
                        }
                    }
                }
                other => {
                    if let Some(col) = other.strip_prefix("f_")
                        && !value.is_empty()
                        && config.filters.iter().any(|f| f.key == col)
                    {
                        query.filters.insert(col.to_string(), value.to_string());
                    }
                }
            }
        }

        query
    }

    /// Current value of a column filter (empty when unset).
    #[must_use]
    pub fn filter_value(&self, key: &str) -> &str {
        self.filters.get(key).map_or("", String::as_str)
    }

    /// Whether any filtering is active.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        !self.q.is_empty() || !self.filters.is_empty()
    }

    /// `"asc"`, `"desc"` or `""` for a column header.
    #[must_use]
    pub fn sort_state(&self, key: &str) -> &'static str {
        match &self.sort {
            Some(sorted) if sorted == key => self.dir.as_str(),
            _ => "",
        }
    }

    /// Encode as a query string (without the leading `?`), omitting defaults.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.q.is_empty() {
            parts.push(format!("q={}", urlencoding::encode(&self.q)));
        }
        if let Some(sort) = &self.sort {
            parts.push(format!("sort={}", urlencoding::encode(sort)));
            parts.push(format!("dir={}", self.dir.as_str()));
        }
        for (key, value) in &self.filters {
            parts.push(format!(
                "f_{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }
        if !self.hidden.is_empty() {
            let hidden: Vec<&str> = self.hidden.iter().map(String::as_str).collect();
            parts.push(format!("hide={}", urlencoding::encode(&hidden.join(","))));
        }
        if self.per_page != DEFAULT_PER_PAGE {
            parts.push(format!("per_page={}", self.per_page));
        }
        if self.page != 1 {
            parts.push(format!("page={}", self.page));
        }
        parts.join("&")
    }

    /// Copy of this query on another page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Copy with a new page size (back to page 1).
    #[must_use]
    pub fn with_per_page(&self, per_page: u32) -> Self {
        Self {
            per_page,
            page: 1,
            ..self.clone()
        }
    }

    /// Copy with the sort on `key` advanced: none, then asc, then desc, then none.
    #[must_use]
    pub fn with_sort_toggled(&self, key: &str) -> Self {
        let (sort, dir) = match (&self.sort, self.dir) {
            (Some(current), SortDirection::Asc) if current == key => {
                (Some(key.to_string()), SortDirection::Desc)
            }
            (Some(current), SortDirection::Desc) if current == key => (None, SortDirection::Asc),
            _ => (Some(key.to_string()), SortDirection::Asc),
        };
        Self {
            sort,
            dir,
            page: 1,
            ..self.clone()
        }
    }

    /// Copy with `key` toggled between hidden and shown.
    #[must_use]
    pub fn with_column_toggled(&self, key: &str) -> Self {
        let mut next = self.clone();
        if !next.hidden.remove(key) {
            next.hidden.insert(key.to_string());
        }
        next
    }
}

// =============================================================================
// Rows
// =============================================================================

/// A single cell value used for filtering and sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// Display text of the cell.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Empty => String::new(),
        }
    }

    /// Case-insensitive substring match; `needle` must already be lowercase.
    fn contains(&self, needle: &str) -> bool {
        match self {
            Self::Empty => false,
            other => other.display().to_lowercase().contains(needle),
        }
    }

    /// Ordering for ascending sorts; empties are handled by the caller.
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (a, b) => a.display().to_lowercase().cmp(&b.display().to_lowercase()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() { Self::Empty } else { Self::Text(s) }
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl<T: Into<Self>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// Rows that can be shown in a data table.
pub trait Tabular {
    /// Value of the column named `key`.
    fn cell(&self, key: &str) -> CellValue;
}

// =============================================================================
// Engine
// =============================================================================

/// Which side did the paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// All rows were loaded; the engine pages them.
    Client,
    /// The source returned one page out of `total_rows`.
    Server {
        total_rows: u64,
        has_next_page: bool,
    },
}

/// Pagination state of a rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub server_side: bool,
    pub current_page: u32,
    pub per_page: u32,
    pub total_rows: u64,
    pub total_pages: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    /// 1-based index of the first row on this page (0 when empty).
    pub first_row: u64,
    /// 1-based index of the last row on this page (0 when empty).
    pub last_row: u64,
}

impl PageInfo {
    /// Compute page info, clamping `page` into `1..=total_pages`.
    #[must_use]
    pub fn new(mode: TableMode, page: u32, per_page: u32, total_rows: u64) -> Self {
        let per_page = per_page.max(1);
        let pages = total_rows.div_ceil(u64::from(per_page)).max(1);
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX);
        let current_page = page.clamp(1, total_pages);

        let (first_row, last_row) = if total_rows == 0 {
            (0, 0)
        } else {
            let first = u64::from(current_page - 1) * u64::from(per_page) + 1;
            let last = (u64::from(current_page) * u64::from(per_page)).min(total_rows);
            (first, last)
        };

        let has_next_page = match mode {
            TableMode::Client => current_page < total_pages,
            TableMode::Server { has_next_page, .. } => has_next_page,
        };

        Self {
            server_side: matches!(mode, TableMode::Server { .. }),
            current_page,
            per_page,
            total_rows,
            total_pages,
            has_previous_page: current_page > 1,
            has_next_page,
            first_row,
            last_row,
        }
    }

    /// Footer text: `"Showing 11-20 of 45 rows"` (server) or `"Page 2 of 5"` (client).
    #[must_use]
    pub fn summary(&self) -> String {
        if self.server_side {
            format!(
                "Showing {}-{} of {} rows",
                self.first_row, self.last_row, self.total_rows
            )
        } else {
            format!("Page {} of {}", self.current_page, self.total_pages)
        }
    }
}

/// One rendered page of rows.
#[derive(Debug, Clone)]
pub struct TablePage<T> {
    pub rows: Vec<T>,
    pub info: PageInfo,
    /// Rows matching the filters before paging (client mode).
    pub filtered_rows: u64,
}

/// Filter, sort and paginate rows in memory.
#[must_use]
pub fn apply<T: Tabular>(
    rows: Vec<T>,
    config: &DataTableConfig,
    query: &TableQuery,
) -> TablePage<T> {
    let visible: Vec<&str> = config
        .visible_columns(query)
        .into_iter()
        .map(|c| c.key.as_str())
        .collect();
    let needle = query.q.to_lowercase();

    let mut matched: Vec<T> = rows
        .into_iter()
        .filter(|row| needle.is_empty() || visible.iter().any(|k| row.cell(k).contains(&needle)))
        .filter(|row| matches_column_filters(row, config, query))
        .collect();

    if let Some(key) = &query.sort {
        let desc = query.dir == SortDirection::Desc;
        // sort_by is stable, equal keys keep their input order
        matched.sort_by(|a, b| {
            let (a, b) = (a.cell(key), b.cell(key));
            match (&a, &b) {
                (CellValue::Empty, CellValue::Empty) => Ordering::Equal,
                (CellValue::Empty, _) => Ordering::Greater,
                (_, CellValue::Empty) => Ordering::Less,
                _ if desc => b.compare(&a),
                _ => a.compare(&b),
            }
        });
    }

    let total = matched.len() as u64;
    let info = PageInfo::new(TableMode::Client, query.page, query.per_page, total);
    let skip = usize::try_from(info.first_row.saturating_sub(1)).unwrap_or(usize::MAX);
    let take = usize::try_from(info.per_page).unwrap_or(usize::MAX);
    let rows = matched.into_iter().skip(skip).take(take).collect();

    TablePage {
        rows,
        info,
        filtered_rows: total,
    }
}

/// Wrap one page fetched from the source.
#[must_use]
pub fn server_page<T>(rows: Vec<T>, query: &TableQuery, total_rows: u64) -> TablePage<T> {
    let shown_through = u64::from(query.page) * u64::from(query.per_page);
    let mode = TableMode::Server {
        total_rows,
        has_next_page: shown_through < total_rows,
    };
    TablePage {
        rows,
        info: PageInfo::new(mode, query.page, query.per_page, total_rows),
        filtered_rows: total_rows,
    }
}

fn matches_column_filters<T: Tabular>(
    row: &T,
    config: &DataTableConfig,
    query: &TableQuery,
) -> bool {
    query.filters.iter().all(|(key, value)| {
        let cell = row.cell(key);
        let wanted = value.to_lowercase();
        match config.filters.iter().find(|f| &f.key == key) {
            Some(f) if f.filter_type == FilterType::Select => {
                cell.display().to_lowercase() == wanted
            }
            _ => cell.contains(&wanted),
        }
    })
}

// =============================================================================
// Links
// =============================================================================

/// Navigation links for the pagination footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    pub first: String,
    pub previous: String,
    pub next: String,
    pub last: String,
}

impl PageLinks {
    /// Build first/previous/next/last links preserving every other parameter.
    #[must_use]
    pub fn new(config: &DataTableConfig, query: &TableQuery, info: &PageInfo) -> Self {
        let link = |page: u32| href(config, &query.with_page(page));
        Self {
            first: link(1),
            previous: link(info.current_page.saturating_sub(1).max(1)),
            next: link(info.current_page.saturating_add(1).min(info.total_pages)),
            last: link(info.total_pages),
        }
    }
}

/// `base_path` plus the encoded query.
#[must_use]
pub fn href(config: &DataTableConfig, query: &TableQuery) -> String {
    let qs = query.to_query_string();
    if qs.is_empty() {
        config.base_path.clone()
    } else {
        format!("{}?{qs}", config.base_path)
    }
}

// =============================================================================
// View
// =============================================================================

/// A column header as rendered.
#[derive(Debug, Clone)]
pub struct HeaderView {
    pub key: String,
    pub label: String,
    pub numeric: bool,
    /// Link that advances the sort on this column; `None` when not sortable.
    pub sort_href: Option<String>,
    /// `"asc"`, `"desc"` or `""`.
    pub sort_state: &'static str,
}

/// An entry in the column picker.
#[derive(Debug, Clone)]
pub struct ColumnToggle {
    pub label: String,
    pub visible: bool,
    pub href: String,
}

/// A column filter input with its current value.
#[derive(Debug, Clone)]
pub struct FilterView {
    pub param: String,
    pub label: String,
    pub is_select: bool,
    pub placeholder: String,
    pub value: String,
    pub options: Vec<FilterOption>,
}

/// A page-size option.
#[derive(Debug, Clone)]
pub struct PageSizeLink {
    pub size: u32,
    pub href: String,
    pub selected: bool,
}

/// One rendered cell.
#[derive(Debug, Clone)]
pub struct CellView {
    pub key: String,
    pub text: String,
    pub numeric: bool,
}

/// One rendered row.
#[derive(Debug, Clone)]
pub struct RowView {
    pub id: i32,
    pub cells: Vec<CellView>,
    /// Opens the edit dialog; empty for read-only tables.
    pub edit_href: String,
    /// Form action of the delete button; empty for read-only tables.
    pub delete_action: String,
}

/// Everything a template needs to draw a table, precomputed.
#[derive(Debug, Clone)]
pub struct TableView {
    pub table_id: String,
    pub base_path: String,
    pub searchable: bool,
    pub search_placeholder: String,
    pub q: String,
    pub headers: Vec<HeaderView>,
    pub columns: Vec<ColumnToggle>,
    pub filters: Vec<FilterView>,
    pub rows: Vec<RowView>,
    /// Parameters the search form must carry along (sort, page size, hidden columns).
    pub hidden_fields: Vec<(String, String)>,
    pub page_sizes: Vec<PageSizeLink>,
    pub info: PageInfo,
    pub links: PageLinks,
    pub summary: String,
    pub is_filtered: bool,
    pub clear_href: String,
    /// Link back to the current view, used as the return target of row actions.
    pub self_href: String,
    pub empty_icon: String,
    pub empty_title: String,
    pub empty_description: Option<String>,
    /// Whether rows get edit/delete buttons.
    pub actions: bool,
}

impl TableView {
    /// Build the view for `page`; `row_id` gives the id used by row actions.
    #[must_use]
    pub fn new<T: Tabular>(
        config: &DataTableConfig,
        query: &TableQuery,
        page: &TablePage<T>,
        row_id: impl Fn(&T) -> i32,
    ) -> Self {
        // Links are built from the clamped page so "next" on an overshoot is sane
        let query = query.with_page(page.info.current_page);
        let visible = config.visible_columns(&query);

        let headers = visible
            .iter()
            .map(|c| HeaderView {
                key: c.key.clone(),
                label: c.label.clone(),
                numeric: c.numeric,
                sort_href: c
                    .sortable
                    .then(|| href(config, &query.with_sort_toggled(&c.key))),
                sort_state: query.sort_state(&c.key),
            })
            .collect();

        let columns = config
            .columns
            .iter()
            .map(|c| ColumnToggle {
                label: c.label.clone(),
                visible: !query.hidden.contains(&c.key),
                href: href(config, &query.with_column_toggled(&c.key)),
            })
            .collect();

        let filters = config
            .filters
            .iter()
            .map(|f| FilterView {
                param: f.param(),
                label: f.label.clone(),
                is_select: f.filter_type == FilterType::Select,
                placeholder: f.placeholder.clone().unwrap_or_default(),
                value: query.filter_value(&f.key).to_string(),
                options: f.options.clone(),
            })
            .collect();

        let rows = page
            .rows
            .iter()
            .map(|row| RowView {
                id: row_id(row),
                cells: visible
                    .iter()
                    .map(|c| CellView {
                        key: c.key.clone(),
                        text: row.cell(&c.key).display(),
                        numeric: c.numeric,
                    })
                    .collect(),
                edit_href: String::new(),
                delete_action: String::new(),
            })
            .collect();

        let mut hidden_fields = Vec::new();
        if let Some(sort) = &query.sort {
            hidden_fields.push(("sort".to_string(), sort.clone()));
            hidden_fields.push(("dir".to_string(), query.dir.as_str().to_string()));
        }
        if query.per_page != DEFAULT_PER_PAGE {
            hidden_fields.push(("per_page".to_string(), query.per_page.to_string()));
        }
        if !query.hidden.is_empty() {
            let hidden: Vec<&str> = query.hidden.iter().map(String::as_str).collect();
            hidden_fields.push(("hide".to_string(), hidden.join(",")));
        }

        let page_sizes = PAGE_SIZES
            .iter()
            .map(|&size| PageSizeLink {
                size,
                href: href(config, &query.with_per_page(size)),
                selected: size == query.per_page,
            })
            .collect();

        let cleared = TableQuery {
            q: String::new(),
            filters: BTreeMap::new(),
            page: 1,
            ..query.clone()
        };

        Self {
            table_id: config.table_id.clone(),
            base_path: config.base_path.clone(),
            searchable: config.searchable,
            search_placeholder: config.search_placeholder.clone(),
            q: query.q.clone(),
            headers,
            columns,
            filters,
            rows,
            hidden_fields,
            page_sizes,
            info: page.info,
            links: PageLinks::new(config, &query, &page.info),
            summary: page.info.summary(),
            is_filtered: query.is_filtered(),
            clear_href: href(config, &cleared),
            self_href: href(config, &query),
            empty_icon: config.empty_icon.clone(),
            empty_title: config.empty_title.clone(),
            empty_description: config.empty_description.clone(),
            actions: false,
        }
    }

    /// Add edit and delete actions to every row.
    ///
    /// Edit opens the dialog on the current view (`?edit=<id>`); delete posts
    /// to `<base_path>/<id>/delete`.
    #[must_use]
    pub fn with_row_actions(mut self) -> Self {
        let separator = if self.self_href.contains('?') { '&' } else { '?' };
        for row in &mut self.rows {
            row.edit_href = format!("{}{separator}edit={}", self.self_href, row.id);
            row.delete_action = format!("{}/{}/delete", self.base_path, row.id);
        }
        self.actions = true;
        self
    }

    /// Link that opens the "add" dialog on the current view.
    #[must_use]
    pub fn add_href(&self) -> String {
        let separator = if self.self_href.contains('?') { '&' } else { '?' };
        format!("{}{separator}dialog=add", self.self_href)
    }

    /// Number of rendered columns, for `colspan` on the empty row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}
