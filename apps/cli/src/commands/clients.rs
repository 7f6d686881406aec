//! `billwise clients search <query>`

use billwise_core::{find_duplicate_client, ClientSummary};
use billwise_db::RecordStore;
use comfy_table::{Attribute, Cell, Table};

use crate::error::ApiResult;

/// A search hit, flagged when it is the same client as the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHit {
    pub exact: bool,
    pub client: ClientSummary,
}

pub async fn run<S: RecordStore>(store: &S, query: &str) -> ApiResult<()> {
    let hits = search(store, query).await?;
    if hits.is_empty() {
        println!("No clients match \"{}\"", query.trim());
        return Ok(());
    }
    println!("{}", render(&hits));
    Ok(())
}

/// Store search, exact matches first, otherwise in store order.
pub async fn search<S: RecordStore>(store: &S, query: &str) -> ApiResult<Vec<ClientHit>> {
    let query = query.trim();
    let candidates = store.find_clients_by_query(query).await?;

    let mut hits: Vec<ClientHit> = candidates
        .into_iter()
        .map(|client| ClientHit {
            exact: find_duplicate_client(query, query, std::slice::from_ref(&client)).is_some(),
            client,
        })
        .collect();
    hits.sort_by_key(|hit| !hit.exact);
    Ok(hits)
}

pub fn render(hits: &[ClientHit]) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new(""),
        Cell::new("Name"),
        Cell::new("Email"),
        Cell::new("Company"),
        Cell::new("Id"),
    ]);

    for hit in hits {
        let name = if hit.exact {
            Cell::new(&hit.client.name).add_attribute(Attribute::Bold)
        } else {
            Cell::new(&hit.client.name)
        };
        table.add_row(vec![
            Cell::new(if hit.exact { "=" } else { "~" }),
            name,
            Cell::new(&hit.client.email),
            Cell::new(hit.client.company.as_deref().unwrap_or("")),
            Cell::new(&hit.client.id),
        ]);
    }

    table.to_string()
}
