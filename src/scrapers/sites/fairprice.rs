use scraper::{ElementRef, Html};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{ProductData, dedup_preserving_order};
use crate::scrapers::traits::{AdapterContext, SiteAdapter};
use crate::utils::error::Result;
use crate::utils::html::{
    clean_text, following_elements, is_tag, next_element_siblings, parent_element, select_all,
    select_first, stripped_text, text_of,
};
use crate::utils::relaxed_json::parse_json_ld;

const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;
const DICT_BLOCKS: [&str; 2] = ["PRODUCT DETAILS", "NUTRITIONAL DATA"];

/// Grocery pages: a JSON-LD data island first, DOM metadata second.
pub struct FairpriceAdapter {
    ctx: AdapterContext,
}

impl FairpriceAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

/// Fields read from the block that follows `.tagWrapper`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MetaBlock {
    pub product_name: String,
    pub brand: String,
    pub size_quantity: String,
    pub price: String,
    pub original_price: String,
}

impl SiteAdapter for FairpriceAdapter {
    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn parse_product_data(&self, html: &str, product_id: &str, url: &str) -> Result<ProductData> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let Some(json_ld) = extract_json_ld(root) else {
            warn!(product_id = %product_id, "No JSON-LD data found, returning empty record");
            return Ok(ProductData::empty(product_id, url));
        };

        let meta = parse_meta(root);

        let product_name = ld_str(&json_ld, &["name"])
            .or_else(|| parse_title(root))
            .unwrap_or_default();
        let brand = ld_str(&json_ld, &["brand", "name"])
            .or_else(|| parse_brand(root))
            .unwrap_or_default();
        let price_current = ld_price(&json_ld).unwrap_or_else(|| meta.price.clone());

        let image_urls_original = parse_image_urls(root, &json_ld);
        let image_urls_simplified = dedup_preserving_order(image_urls_original.iter().map(|u| simplify_image_url(u)));

        let mut infos = Map::new();
        infos.insert("meta".into(), serde_json::to_value(&meta)?);
        infos.insert("script".into(), json_ld);
        infos.insert("description".into(), Value::Object(parse_product_blocks(root)));

        let mut data = ProductData::new(product_id, url);
        data.product_name = product_name;
        data.brand = brand;
        data.price_current = price_current;
        data.price_original = meta.original_price;
        data.image_urls_original = image_urls_original;
        data.image_urls_simplified = image_urls_simplified;
        data.infos = Value::Object(infos);
        Ok(data)
    }
}

/// Drop the query string and the last `_token` before the extension:
/// `.../10020187_RXL1_20250513.jpg?w=200` becomes `.../10020187_RXL1.jpg`.
pub fn simplify_image_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let base = url.split('?').next().unwrap_or(url);
    let Some((dir, filename)) = base.rsplit_once('/') else {
        return base.to_string();
    };

    let Some(underscore) = filename.rfind('_') else {
        return base.to_string();
    };
    let tail = &filename[underscore + 1..];
    let Some(dot) = tail.rfind('.') else {
        return base.to_string();
    };
    let extension = &tail[dot..];
    if extension.len() < 2 || !extension[1..].chars().all(|c| c.is_alphanumeric() || c == '_') {
        return base.to_string();
    }

    format!("{}/{}{}", dir, &filename[..underscore], extension)
}

/// The JSON-LD object, preferring the block marked `data-next-head`.
/// `None` when the block is missing, undecodable or not an object.
fn extract_json_ld(root: ElementRef<'_>) -> Option<Value> {
    let scripts = select_all(root, JSON_LD_SELECTOR);
    let script = scripts
        .iter()
        .find(|s| s.value().attr("data-next-head").is_some())
        .or_else(|| scripts.first())?;

    let raw: String = script.text().collect();
    match parse_json_ld(&raw) {
        Ok(value @ Value::Object(_)) if value.as_object().is_some_and(|o| !o.is_empty()) => Some(value),
        Ok(_) => {
            debug!("JSON-LD block is not a product object");
            None
        }
        Err(e) => {
            warn!("Failed to decode JSON-LD block: {}", e);
            None
        }
    }
}

/// Non-empty string at `path`.
fn ld_str(ld: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(ld, |node, key| node.get(*key))
        .and_then(Value::as_str)
        .map(clean_text)
        .filter(|s| !s.is_empty())
}

/// `offers.price`, which may be a number or a string; `offers` may be a list.
fn ld_price(ld: &Value) -> Option<String> {
    let offers = ld.get("offers")?;
    let offer = match offers {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match offer.get("price")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_title(root: ElementRef<'_>) -> Option<String> {
    if let Some(h1) = select_first(root, "h1.product-name") {
        return Some(text_of(h1));
    }
    select_first(root, r#"meta[property="og:title"]"#)
        .and_then(|meta| meta.value().attr("content"))
        .map(clean_text)
}

fn next_link(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    following_elements(element).into_iter().find(|el| is_tag(*el, "a"))
}

fn parse_brand(root: ElementRef<'_>) -> Option<String> {
    let label = select_all(root, "span")
        .into_iter()
        .find(|span| stripped_text(*span).to_lowercase().contains("brand:"))?;
    let link = next_link(label)?;
    Some(clean_text(&text_of(link).replace("Brand:", "")))
}

fn parse_meta(root: ElementRef<'_>) -> MetaBlock {
    let mut meta = MetaBlock::default();

    let Some(target) = select_first(root, ".tagWrapper")
        .and_then(|wrapper| next_element_siblings(wrapper).find(|el| is_tag(*el, "div")))
    else {
        return meta;
    };

    if let Some(price) = select_first(target, r#"span[weight="black"]"#) {
        meta.price = stripped_text(price);

        let parent_span = std::iter::successors(parent_element(price), |el| parent_element(*el))
            .find(|el| is_tag(*el, "span"));
        if let Some(original) = parent_span
            .and_then(|span| next_element_siblings(span).find(|el| is_tag(*el, "div")))
            .map(stripped_text)
            .filter(|text| text.starts_with('$'))
        {
            meta.original_price = original;
        }
    }

    if let Some(name) = select_first(target, r#"span[weight="regular"]"#) {
        meta.product_name = text_of(name);
    }

    if let Some(quantity) = select_first(target, "span.quantity") {
        meta.size_quantity = text_of(quantity);
    }

    if let Some(link) = select_all(target, "span")
        .into_iter()
        .find(|span| stripped_text(*span) == "Brand:")
        .and_then(next_link)
    {
        meta.brand = text_of(link).replace("Brand: ", "");
    }

    meta
}

fn parse_image_urls(root: ElementRef<'_>, json_ld: &Value) -> Vec<String> {
    let mut urls: Vec<String> = match json_ld.get("image") {
        Some(Value::String(url)) => vec![url.clone()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        _ => Vec::new(),
    };

    if urls.is_empty() {
        for container in ["div.product-image-container", "div.thumbnail-container"] {
            if let Some(block) = select_first(root, container) {
                urls.extend(
                    select_all(block, "img")
                        .into_iter()
                        .filter_map(|img| img.value().attr("src"))
                        .map(str::to_string),
                );
            }
        }
    }

    dedup_preserving_order(urls)
}

/// Titled blocks of the product description. Detail and nutrition lists
/// become maps, other lists newline-joined text, anything else plain text.
fn parse_product_blocks(root: ElementRef<'_>) -> Map<String, Value> {
    let mut blocks = Map::new();
    let Some(container) = select_first(root, r#"div[data-testid="productDescription"]"#) else {
        return blocks;
    };

    for section in select_all(container, r#"div[data-testid="productComplextAttribute"]"#) {
        let Some(title) = select_first(section, "h2") else {
            continue;
        };
        let title_text = stripped_text(title);

        let Some(content) = next_element_siblings(title).find(|el| is_tag(*el, "div") || is_tag(*el, "ul")) else {
            continue;
        };

        let value = if is_tag(content, "ul") && DICT_BLOCKS.contains(&title_text.as_str()) {
            let mut pairs = Map::new();
            for li in select_all(content, "li") {
                let spans = select_all(li, "span");
                if spans.len() >= 2 {
                    pairs.insert(stripped_text(spans[0]), Value::String(stripped_text(spans[1])));
                }
            }
            Value::Object(pairs)
        } else if is_tag(content, "ul") {
            let lines: Vec<String> = select_all(content, "li").into_iter().map(stripped_text).collect();
            Value::String(lines.join("\n"))
        } else {
            Value::String(stripped_text(content))
        };

        blocks.insert(title_text, value);
    }

    blocks
}
