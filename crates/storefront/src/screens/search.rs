//! Search and category results.

use capelli_core::{CatalogEntry, Product};

use crate::api::{ApiCall, ApiReply};
use crate::navigation::{Route, SearchQuery};

use super::{
    Action, Block, Effect, Loadable, Screen, ScreenContext, ScreenEvent, View, category_route,
    find_product, header, open_product, product_item, products_of, search_route,
};

pub struct SearchScreen {
    ctx: ScreenContext,
    query: SearchQuery,
    catalog: Loadable<Vec<CatalogEntry>>,
    message: Option<String>,
}

impl SearchScreen {
    #[must_use]
    pub const fn new(ctx: ScreenContext, query: SearchQuery) -> Self {
        Self {
            ctx,
            query,
            catalog: Loadable::Loading,
            message: None,
        }
    }

    /// Products matching the current query.
    pub fn results(&self) -> impl Iterator<Item = &Product> + Clone {
        self.catalog
            .loaded()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(CatalogEntry::as_product)
            .filter(|product| self.query.matches(product))
    }

    fn title(&self) -> String {
        match &self.query {
            SearchQuery::Category(category) => category.clone(),
            SearchQuery::Text(text) => format!("Results for \"{text}\""),
        }
    }
}

impl Screen for SearchScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Mounted => vec![Effect::Api(ApiCall::Products)],
            ScreenEvent::ParamsChanged(Route::Search(query)) => {
                self.query = query;
                Vec::new()
            }
            ScreenEvent::Reply(ApiReply::Products(result)) => {
                self.catalog = result.into();
                Vec::new()
            }
            ScreenEvent::Input(action) => {
                self.message = None;
                match action {
                    Action::Retry if self.catalog.is_failed() => {
                        self.catalog = Loadable::Loading;
                        vec![Effect::Api(ApiCall::Products)]
                    }
                    Action::SelectCategory(label) => {
                        vec![Effect::replace(category_route(&self.ctx, &label))]
                    }
                    Action::Search(query) => search_route(&query)
                        .map(Effect::replace)
                        .into_iter()
                        .collect(),
                    Action::OpenProduct(title) => {
                        let Some(entries) = self.catalog.loaded() else {
                            return Vec::new();
                        };
                        if let Some(product) = find_product(products_of(entries), &title) {
                            vec![open_product(product)]
                        } else {
                            self.message = Some(format!("No product matches \"{title}\""));
                            Vec::new()
                        }
                    }
                    other => header(other),
                }
            }
            _ => Vec::new(),
        }
    }

    fn view(&self) -> View {
        let mut view = View::new(self.title()).with(Block::Menu(self.ctx.categories.to_vec()));

        match &self.catalog {
            Loadable::Loading => view.push(Block::Loading),
            Loadable::Failed(message) => view.error(message.clone(), true),
            Loadable::Loaded(_) => {
                let mut any = false;
                for product in self.results() {
                    any = true;
                    view.push(product_item(product));
                }
                if !any {
                    view.text("No products found");
                }
            }
        }

        if let Some(message) = &self.message {
            view.push(Block::Notice(message.clone()));
        }
        view
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::navigation::NavAction;
    use crate::screens::testing::{input, nav};
    use capelli_core::{Banner, Price};

    fn product(title: &str, category: &str) -> CatalogEntry {
        CatalogEntry::Product(Product {
            title: title.to_string(),
            image: String::new(),
            category: category.to_string(),
            price: Price::parse("10").unwrap(),
        })
    }

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::Banner(Banner {
                title: "clippers sale".to_string(),
                image: String::new(),
            }),
            product("Wahl Senior", "Clippers"),
            product("Wahl Detailer", "Trimmers"),
            product("Andis Master", "clippers"),
        ]
    }

    fn titles(screen: &SearchScreen) -> Vec<&str> {
        screen.results().map(|p| p.title.as_str()).collect()
    }

    fn loaded(query: SearchQuery) -> SearchScreen {
        let mut screen = SearchScreen::new(ScreenContext::default(), query);
        screen.handle(ScreenEvent::Mounted);
        screen.handle(ScreenEvent::Reply(ApiReply::Products(Ok(catalog()))));
        screen
    }

    #[test]
    fn test_category_matches_case_insensitively() {
        let screen = loaded(SearchQuery::Category("Clippers".to_string()));
        assert_eq!(titles(&screen), vec!["Wahl Senior", "Andis Master"]);
        assert_eq!(screen.view().title, "Clippers");
    }

    #[test]
    fn test_text_matches_title_substring_and_skips_banners() {
        let screen = loaded(SearchQuery::Text("WAHL".to_string()));
        assert_eq!(titles(&screen), vec!["Wahl Senior", "Wahl Detailer"]);

        let screen = loaded(SearchQuery::Text("sale".to_string()));
        assert!(titles(&screen).is_empty());
        assert!(screen.view().contains("No products found"));
    }

    #[test]
    fn test_params_change_requeries() {
        let mut screen = loaded(SearchQuery::Text("andis".to_string()));
        screen.handle(ScreenEvent::ParamsChanged(Route::Search(SearchQuery::Category(
            "Trimmers".to_string(),
        ))));
        assert_eq!(titles(&screen), vec!["Wahl Detailer"]);
    }

    #[test]
    fn test_home_category_goes_home() {
        let mut screen = loaded(SearchQuery::Text("andis".to_string()));
        let effects = screen.handle(input(Action::SelectCategory("Home".to_string())));
        assert_eq!(nav(&effects), Some(&NavAction::Replace(Route::Home)));
    }

    #[test]
    fn test_open_result() {
        let mut screen = loaded(SearchQuery::Category("Trimmers".to_string()));
        let effects = screen.handle(input(Action::OpenProduct("Wahl Detailer".to_string())));
        assert!(matches!(
            nav(&effects),
            Some(NavAction::Navigate(Route::Product(_)))
        ));
    }
}
