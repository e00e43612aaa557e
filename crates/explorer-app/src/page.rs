//! Method pages and the catalog they are listed in

use std::collections::BTreeMap;

use explorer_core::prelude::*;
use explorer_core::{find_node, leaf_keys, FormKey, MenuNode, ParameterSchema};

/// One SDK method form: what to call and which parameters it takes
#[derive(Debug, Clone, PartialEq)]
pub struct PageSpec {
    pub key: FormKey,
    pub title: String,
    pub description: Option<String>,
    pub schema: ParameterSchema,
    /// Global identifier the successful result is stored under
    pub store_result_as: Option<String>,
}

impl PageSpec {
    pub fn new(namespace: &str, method: &str, schema: ParameterSchema) -> Self {
        Self {
            key: FormKey::new(namespace, method),
            title: method.to_string(),
            description: None,
            schema,
            store_result_as: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn store_result_as(mut self, identifier: impl Into<String>) -> Self {
        self.store_result_as = Some(identifier.into());
        self
    }
}

/// All pages plus the menu that navigates them
///
/// Menu leaves are keyed by the page's `namespace.method`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pages: BTreeMap<FormKey, PageSpec>,
    menu: Vec<MenuNode>,
}

impl Catalog {
    pub fn new(menu: Vec<MenuNode>) -> Self {
        Self {
            pages: BTreeMap::new(),
            menu,
        }
    }

    pub fn add(&mut self, page: PageSpec) -> &mut Self {
        if find_node(&self.menu, &page.key.storage_key()).is_none() {
            debug!("Page {} is not reachable from the menu", page.key);
        }
        self.pages.insert(page.key.clone(), page);
        self
    }

    pub fn get(&self, key: &FormKey) -> Option<&PageSpec> {
        self.pages.get(key)
    }

    /// Look up a page by its `namespace.method` text
    pub fn find(&self, raw: &str) -> Result<&PageSpec> {
        let key = FormKey::parse(raw)?;
        self.pages
            .get(&key)
            .ok_or_else(|| Error::page_not_found(key.to_string()))
    }

    pub fn pages(&self) -> impl Iterator<Item = &PageSpec> {
        self.pages.values()
    }

    pub fn menu(&self) -> &[MenuNode] {
        &self.menu
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Menu leaves with no page behind them
    pub fn dangling_menu_keys(&self) -> Vec<String> {
        leaf_keys(&self.menu)
            .into_iter()
            .filter(|key| {
                FormKey::parse(key)
                    .map(|k| !self.pages.contains_key(&k))
                    .unwrap_or(true)
            })
            .collect()
    }
}
