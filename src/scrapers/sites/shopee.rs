use async_trait::async_trait;
use scraper::{ElementRef, Html};
use serde_json::{Map, Value};
use tracing::warn;

use crate::core::page_fetcher::PageFetcher;
use crate::models::{ProductData, dedup_preserving_order};
use crate::scrapers::traits::{AdapterContext, SiteAdapter};
use crate::utils::error::Result;
use crate::utils::html::{
    clean_text, element_children, following_elements, is_tag, joined_text, next_element_siblings,
    parent_element, prev_element_siblings, select_all, select_first, stripped_text, text_of,
};

const SPECIFICATIONS: &str = "Product Specifications";
const DESCRIPTION: &str = "Product Description";

/// Marketplace that blocks automated browsers: pages are only ever read
/// from saved snapshots.
pub struct ShopeeAdapter {
    ctx: AdapterContext,
}

impl ShopeeAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SiteAdapter for ShopeeAdapter {
    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    async fn fetch_page(&self, _fetcher: &dyn PageFetcher) -> Result<Option<String>> {
        warn!(product_id = %self.ctx.product_id, "Live fetching is blocked for shopee, reading local HTML instead");
        self.get_local_html().map(Some)
    }

    fn parse_product_data(&self, html: &str, product_id: &str, url: &str) -> Result<ProductData> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let (price_current, price_original) = parse_price(root).unwrap_or_default();
        let image_urls_original = parse_image_urls(root);
        let image_urls_simplified = simplify_image_urls(&image_urls_original);

        let mut infos = Map::new();
        infos.insert(SPECIFICATIONS.into(), Value::Object(parse_specifications(root)));
        infos.insert(
            DESCRIPTION.into(),
            Value::String(parse_description(root).unwrap_or_default()),
        );

        let mut data = ProductData::new(product_id, url);
        data.product_name = parse_title(root).unwrap_or_default();
        data.brand = parse_brand(root).unwrap_or_default();
        data.price_current = price_current;
        data.price_original = price_original.unwrap_or_default();
        data.image_urls_original = image_urls_original;
        data.image_urls_simplified = image_urls_simplified;
        data.infos = Value::Object(infos);
        Ok(data)
    }
}

/// Cut each URL at the resize marker `@` and de-duplicate the bases.
pub fn simplify_image_urls(urls: &[String]) -> Vec<String> {
    dedup_preserving_order(
        urls.iter()
            .map(|url| url.split('@').next().unwrap_or(url).to_string()),
    )
}

fn parse_title(root: ElementRef<'_>) -> Option<String> {
    let sections = select_all(root, "section.flex.card > section");
    let target = sections.get(1)?;
    select_first(*target, "h1").map(text_of)
}

/// First section whose first `h2` mentions `heading`.
fn find_section<'a>(scope: ElementRef<'a>, selector: &str, heading: &str) -> Option<ElementRef<'a>> {
    select_all(scope, selector).into_iter().find(|section| {
        select_first(*section, "h2").is_some_and(|h2| text_of(h2).contains(heading))
    })
}

fn parse_brand(root: ElementRef<'_>) -> Option<String> {
    for section in select_all(root, "section") {
        let is_specs = select_first(section, "h2").is_some_and(|h2| text_of(h2).contains(SPECIFICATIONS));
        if !is_specs {
            continue;
        }
        for h3 in select_all(section, "h3") {
            if !text_of(h3).contains("Brand") {
                continue;
            }
            let Some(row) = parent_element(h3) else {
                continue;
            };
            if let Some(link) = select_first(row, "a") {
                return Some(text_of(link));
            }
            if let Some(text) = select_all(row, "div")
                .into_iter()
                .map(stripped_text)
                .find(|t| !t.is_empty())
            {
                return Some(clean_text(&text));
            }
        }
    }
    None
}

/// Current and original price. The structural path under the live price
/// region is tried first, then the `$` blocks that follow the title.
fn parse_price(root: ElementRef<'_>) -> Option<(String, Option<String>)> {
    for section in select_all(root, r#"section[aria-live="polite"]"#) {
        let Some(current) = select_first(section, "div.jRlVo0")
            .and_then(|block| select_first(block, "div.IZPeQz.B67UQ0"))
            .map(text_of)
        else {
            continue;
        };

        let original = std::iter::successors(parent_element(section), |el| parent_element(*el))
            .find(|el| is_tag(*el, "div"))
            .and_then(|container| select_first(container, "div.yJfHJc"))
            .and_then(|lowest| {
                select_all(lowest, "span")
                    .into_iter()
                    .map(stripped_text)
                    .find(|t| t.starts_with('$'))
            })
            .map(|t| clean_text(&t));

        return Some((current, original));
    }

    price_after_title(root)
}

fn price_after_title(root: ElementRef<'_>) -> Option<(String, Option<String>)> {
    let h1 = select_first(root, "h1")?;
    let candidate = following_elements(h1)
        .into_iter()
        .find(|el| is_tag(*el, "div") && el.text().collect::<String>().contains('$'))?;

    // A div whose only child is a `$` text node marks the price row; its
    // parent holds current and original price side by side.
    let price_block = select_all(candidate, "div")
        .into_iter()
        .find(|div| single_text(*div).is_some_and(|t| t.contains('$')))
        .and_then(|inner| std::iter::successors(parent_element(inner), |el| parent_element(*el)).find(|el| is_tag(*el, "div")))
        .unwrap_or(candidate);

    let prices: Vec<String> = element_children(price_block)
        .filter(|child| is_tag(*child, "div"))
        .map(stripped_text)
        .filter(|t| t.starts_with('$'))
        .map(|t| clean_text(&t))
        .collect();

    let mut prices = prices.into_iter();
    let current = prices.next()?;
    Some((current, prices.next()))
}

/// Text of an element that has exactly one child and that child is text.
fn single_text<'a>(element: ElementRef<'a>) -> Option<&'a str> {
    let mut children = element.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    only.value().as_text().map(|t| &**t)
}

/// Thumbnail strip: every `div` containing a selection mask points at the
/// preceding sibling `div`, whose `<source srcset>` holds the image URL.
fn parse_image_urls(root: ElementRef<'_>) -> Vec<String> {
    let Some(gallery) = select_first(root, "section.card section") else {
        return Vec::new();
    };

    select_all(gallery, "div")
        .into_iter()
        .filter(|div| select_first(*div, "div.thumbnail-selected-mask").is_some())
        .filter_map(|thumb| {
            let previous = prev_element_siblings(thumb).find(|el| is_tag(*el, "div"))?;
            let srcset = select_first(previous, "source")?.value().attr("srcset")?;
            srcset.split_whitespace().next().map(str::to_string)
        })
        .collect()
}

fn parse_specifications(root: ElementRef<'_>) -> Map<String, Value> {
    let mut specs = Map::new();
    let Some(section) = find_section(root, "div.product-detail section", SPECIFICATIONS) else {
        return specs;
    };

    for h3 in select_all(section, "h3") {
        let key = text_of(h3);
        let value: Vec<String> = next_element_siblings(h3)
            .take_while(|el| !is_tag(*el, "h3") && !is_tag(*el, "h2"))
            .map(|el| clean_text(&joined_text(el, " ")))
            .filter(|t| !t.is_empty())
            .collect();
        specs.insert(key, Value::String(value.join("\n")));
    }
    specs
}

fn parse_description(root: ElementRef<'_>) -> Option<String> {
    let section = find_section(root, "div.product-detail section", DESCRIPTION)?;
    let paragraphs = dedup_preserving_order(
        select_all(section, "p")
            .into_iter()
            .map(|p| clean_text(&stripped_text(p)))
            .filter(|t| !t.is_empty()),
    );
    (!paragraphs.is_empty()).then(|| paragraphs.join("\n"))
}
