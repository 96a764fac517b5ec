//! Home screen: banner, category menu, search box and the full listing.

use capelli_core::CatalogEntry;

use crate::api::{ApiCall, ApiReply};
use crate::navigation::Route;

use super::{
    Action, Block, Effect, Loadable, Screen, ScreenContext, ScreenEvent, View, category_route,
    find_product, header, open_product, product_item, products_of, search_route,
};

pub struct HomeScreen {
    ctx: ScreenContext,
    catalog: Loadable<Vec<CatalogEntry>>,
    message: Option<String>,
}

impl HomeScreen {
    #[must_use]
    pub const fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            catalog: Loadable::Loading,
            message: None,
        }
    }

    /// Catalog entries as listed, banner first.
    #[must_use]
    pub const fn entries(&self) -> Option<&Vec<CatalogEntry>> {
        self.catalog.loaded()
    }

    fn on_catalog(&mut self, loaded: Loadable<Vec<CatalogEntry>>) {
        self.catalog = match loaded {
            Loadable::Loaded(mut entries) => {
                if let Some(banner) = &self.ctx.banner {
                    entries.insert(0, CatalogEntry::Banner(banner.clone()));
                }
                Loadable::Loaded(entries)
            }
            other => other,
        };
    }
}

impl Screen for HomeScreen {
    fn handle(&mut self, event: ScreenEvent) -> Vec<Effect> {
        match event {
            ScreenEvent::Mounted => vec![Effect::Api(ApiCall::Products)],
            ScreenEvent::Reply(ApiReply::Products(result)) => {
                self.on_catalog(result.into());
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
                        let route = category_route(&self.ctx, &label);
                        if route == Route::Home {
                            Vec::new()
                        } else {
                            vec![Effect::replace(route)]
                        }
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
        let mut view = View::new("Capelli").with(Block::Menu(self.ctx.categories.to_vec()));

        match &self.catalog {
            Loadable::Loading => view.push(Block::Loading),
            Loadable::Failed(message) => view.error(message.clone(), true),
            Loadable::Loaded(entries) => {
                for entry in entries {
                    match entry {
                        CatalogEntry::Banner(banner) => {
                            view.text(format!("[{}] {}", banner.title, banner.image));
                        }
                        CatalogEntry::Product(product) => view.push(product_item(product)),
                    }
                }
            }
        }

        if let Some(message) = &self.message {
            view.push(Block::Notice(message.clone()));
        }
        view
    }
}
