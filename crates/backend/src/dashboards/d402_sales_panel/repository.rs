use async_trait::async_trait;
use chrono::NaiveDate;
use contracts::dashboards::d402_sales_panel::{
    DateRange, Leaderboard, RankedRow, SalesMetadata, SalesRow, StateRef, StateSalesRow,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, FromQueryResult, Statement, Value};
use std::collections::BTreeSet;

use super::error::{DashboardError, DashboardResult};
use super::leaderboard_selection::LeaderboardQuery;

pub const NO_SELLER_LABEL: &str = "(No seller)";
pub const NO_STORE_LABEL: &str = "(No store)";

/// Data access contract of the sales panel.
///
/// Results are a pure function of the arguments. An empty product set yields
/// no rows; an empty state set means no restriction by state.
#[async_trait]
pub trait SalesDataSource: Send + Sync {
    /// Date bounds, every state and every product that has sales
    async fn metadata(&self) -> DashboardResult<SalesMetadata>;

    /// Sales total per state (map)
    async fn sales_by_state(
        &self,
        range: DateRange,
        products: &BTreeSet<String>,
    ) -> DashboardResult<Vec<StateSalesRow>>;

    /// Sales per day, state and product (tables and charts)
    async fn sales_filtered(
        &self,
        range: DateRange,
        states: &BTreeSet<String>,
        products: &BTreeSet<String>,
    ) -> DashboardResult<Vec<SalesRow>>;

    /// Top N sellers and stores; a pinned seller restricts stores and vice versa
    async fn top_sellers_and_stores(&self, query: &LeaderboardQuery)
        -> DashboardResult<Leaderboard>;
}

/// SQLite implementation over the d402_* sales tables
#[derive(Clone)]
pub struct SalesRepository {
    db: DatabaseConnection,
}

const SALES_FROM: &str = r#"
    FROM d402_sales_order o
    JOIN d402_sales_order_detail d ON d.order_id = o.id
    JOIN d402_product p ON d.product_id = p.id
    JOIN d402_state_province sp ON o.ship_state_id = sp.id
    LEFT JOIN d402_sales_person sr ON o.sales_person_id = sr.id
    LEFT JOIN d402_store st ON o.store_id = st.id
"#;

/// State code as the catalog sees it (trimmed, upper case)
const STATE_CODE_EXPR: &str = "UPPER(TRIM(sp.code))";

/// WHERE clause shared by every sales query
struct SalesPredicate {
    sql: String,
    params: Vec<Value>,
}

impl SalesPredicate {
    fn new(range: DateRange, states: &BTreeSet<String>, products: &BTreeSet<String>) -> Self {
        let mut sql = format!(
            "WHERE sp.country_code = 'US' AND date(o.order_date) BETWEEN ? AND ? AND p.name IN ({})",
            placeholders(products.len())
        );
        let mut params: Vec<Value> = vec![format_date(range.start).into(), format_date(range.end).into()];
        params.extend(products.iter().map(|p| Value::from(p.as_str())));

        if !states.is_empty() {
            sql.push_str(&format!(
                " AND {} IN ({})",
                STATE_CODE_EXPR,
                placeholders(states.len())
            ));
            params.extend(states.iter().map(|s| Value::from(s.as_str())));
        }

        Self { sql, params }
    }

    fn and_equals(mut self, expr: &str, value: &str) -> Self {
        self.sql.push_str(&format!(" AND {} = ?", expr));
        self.params.push(value.into());
        self
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(value: &str) -> DashboardResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        DashboardError::DataSourceUnavailable(format!("bad order date '{}': {}", value, e))
    })
}

fn seller_expr() -> String {
    format!("COALESCE(sr.first_name || ' ' || sr.last_name, '{}')", NO_SELLER_LABEL)
}

fn store_expr() -> String {
    format!("COALESCE(st.name, '{}')", NO_STORE_LABEL)
}

impl SalesRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn statement(sql: &str, params: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, params)
    }

    async fn ranking(
        &self,
        name_expr: &str,
        predicate: SalesPredicate,
        top_n: usize,
    ) -> DashboardResult<Vec<RankedRow>> {
        #[derive(Debug, FromQueryResult)]
        struct RankedQueryRow {
            name: String,
            sales_value: f64,
        }

        let sql = format!(
            "SELECT {expr} AS name, CAST(SUM(d.line_total) AS REAL) AS sales_value {from} {filter} \
             GROUP BY {expr} ORDER BY sales_value DESC, name ASC LIMIT ?",
            expr = name_expr,
            from = SALES_FROM,
            filter = predicate.sql,
        );
        let mut params = predicate.params;
        params.push((top_n as i64).into());

        let rows = RankedQueryRow::find_by_statement(Self::statement(&sql, params))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| RankedRow {
                name: r.name,
                sales_value: r.sales_value,
            })
            .collect())
    }
}

#[async_trait]
impl SalesDataSource for SalesRepository {
    async fn metadata(&self) -> DashboardResult<SalesMetadata> {
        #[derive(Debug, FromQueryResult)]
        struct DateBounds {
            min_date: Option<String>,
            max_date: Option<String>,
        }

        #[derive(Debug, FromQueryResult)]
        struct StateRefRow {
            code: String,
            name: String,
        }

        #[derive(Debug, FromQueryResult)]
        struct ProductRow {
            name: String,
        }

        let bounds = DateBounds::find_by_statement(Self::statement(
            "SELECT MIN(date(o.order_date)) AS min_date, MAX(date(o.order_date)) AS max_date \
             FROM d402_sales_order o",
            vec![],
        ))
        .one(&self.db)
        .await?;

        let (min_date, max_date) = match bounds {
            Some(DateBounds {
                min_date: Some(min),
                max_date: Some(max),
            }) => (parse_date(&min)?, parse_date(&max)?),
            _ => {
                return Err(DashboardError::DataSourceUnavailable(
                    "sales order table is empty".to_string(),
                ))
            }
        };

        let states = StateRefRow::find_by_statement(Self::statement(
            r#"
            SELECT DISTINCT UPPER(TRIM(sp.code)) AS code, sp.name AS name
            FROM d402_sales_order o
            JOIN d402_state_province sp ON o.ship_state_id = sp.id
            WHERE sp.country_code = 'US'
            ORDER BY sp.name
            "#,
            vec![],
        ))
        .all(&self.db)
        .await?;

        let products = ProductRow::find_by_statement(Self::statement(
            r#"
            SELECT DISTINCT p.name AS name
            FROM d402_sales_order_detail d
            JOIN d402_product p ON d.product_id = p.id
            ORDER BY p.name
            "#,
            vec![],
        ))
        .all(&self.db)
        .await?;

        Ok(SalesMetadata {
            min_date,
            max_date,
            states: states
                .into_iter()
                .map(|s| StateRef {
                    code: s.code,
                    name: s.name,
                })
                .collect(),
            products: products.into_iter().map(|p| p.name).collect(),
        })
    }

    async fn sales_by_state(
        &self,
        range: DateRange,
        products: &BTreeSet<String>,
    ) -> DashboardResult<Vec<StateSalesRow>> {
        if products.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(Debug, FromQueryResult)]
        struct StateSalesQueryRow {
            state_code: String,
            sales_value: f64,
        }

        let predicate = SalesPredicate::new(range, &BTreeSet::new(), products);
        let sql = format!(
            "SELECT {code} AS state_code, CAST(SUM(d.line_total) AS REAL) AS sales_value {from} {filter} \
             GROUP BY {code} ORDER BY {code}",
            code = STATE_CODE_EXPR,
            from = SALES_FROM,
            filter = predicate.sql,
        );

        let rows = StateSalesQueryRow::find_by_statement(Self::statement(&sql, predicate.params))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| StateSalesRow {
                state_code: r.state_code,
                sales_value: r.sales_value,
            })
            .collect())
    }

    async fn sales_filtered(
        &self,
        range: DateRange,
        states: &BTreeSet<String>,
        products: &BTreeSet<String>,
    ) -> DashboardResult<Vec<SalesRow>> {
        if products.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(Debug, FromQueryResult)]
        struct SalesQueryRow {
            order_date: String,
            state_code: String,
            state_name: String,
            product: String,
            sales_value: f64,
        }

        let predicate = SalesPredicate::new(range, states, products);
        let sql = format!(
            r#"
            SELECT
                date(o.order_date) AS order_date,
                {code} AS state_code,
                sp.name AS state_name,
                p.name AS product,
                CAST(SUM(d.line_total) AS REAL) AS sales_value
            {from} {filter}
            GROUP BY date(o.order_date), {code}, sp.name, p.name
            ORDER BY order_date, state_code, product
            "#,
            code = STATE_CODE_EXPR,
            from = SALES_FROM,
            filter = predicate.sql,
        );

        let rows = SalesQueryRow::find_by_statement(Self::statement(&sql, predicate.params))
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|r| {
                Ok(SalesRow {
                    order_date: parse_date(&r.order_date)?,
                    state_code: r.state_code,
                    state_name: r.state_name,
                    product: r.product,
                    sales_value: r.sales_value,
                })
            })
            .collect()
    }

    async fn top_sellers_and_stores(
        &self,
        query: &LeaderboardQuery,
    ) -> DashboardResult<Leaderboard> {
        if query.products.is_empty() {
            return Ok(Leaderboard::default());
        }

        let seller = seller_expr();
        let store = store_expr();

        let mut sellers_predicate =
            SalesPredicate::new(query.date_range, &query.states, &query.products);
        if let Some(selected_store) = &query.selected_store {
            sellers_predicate = sellers_predicate.and_equals(&store, selected_store);
        }

        let mut stores_predicate =
            SalesPredicate::new(query.date_range, &query.states, &query.products);
        if let Some(selected_seller) = &query.selected_seller {
            stores_predicate = stores_predicate.and_equals(&seller, selected_seller);
        }

        Ok(Leaderboard {
            sellers: self.ranking(&seller, sellers_predicate, query.top_n).await?,
            stores: self.ranking(&store, stores_predicate, query.top_n).await?,
        })
    }
}
