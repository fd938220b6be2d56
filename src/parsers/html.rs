//! 内嵌 HTML 的 DOM 工具
//!
//! 面向 HTML 片段的解析、序列化与基础 DOM 操作，供内嵌 HTML
//! 子遍历使用。片段被包进 `<html><body>…</body></html>` 解析，
//! 序列化时只取 body 的内部内容。

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// 解析 HTML 片段为 DOM
pub fn fragment_to_dom(fragment: &str) -> RcDom {
    let wrapped = format!("<html><body>{fragment}</body></html>");
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut wrapped.as_bytes())
        .unwrap()
}

/// 取片段 DOM 的 body 节点
pub fn get_body(dom: &RcDom) -> Option<Handle> {
    let html = get_child_node_by_name(&dom.document, "html")?;
    get_child_node_by_name(&html, "body")
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching.cloned()
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 设置节点属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    use html5ever::interface::{Attribute, QualName};
    use html5ever::tendril::format_tendril;
    use html5ever::{namespace_url, ns, LocalName};

    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.clone() {
                    let _ = &attrs_mut[i].value.clear();
                    let _ = &attrs_mut[i].value.push_slice(attr_value.as_str());
                } else {
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value.clone() {
                let name = LocalName::from(attr_name);

                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), name),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 获取元素节点的标签名
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 序列化节点的内部内容（不含节点自身的标签）
pub fn serialize_inner(node: &Handle) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    let _ = serialize(&mut buf, &SerializableHandle::from(node.clone()), opts);
    String::from_utf8_lossy(&buf).into_owned()
}

/// 用给定的 HTML 片段替换节点的全部子节点
pub fn set_inner_html(node: &Handle, html: &str) {
    let dom = fragment_to_dom(html);
    let Some(body) = get_body(&dom) else {
        return;
    };
    let mut children = node.children.borrow_mut();
    children.clear();
    for child in body.children.borrow().iter() {
        child.parent.set(Some(std::rc::Rc::downgrade(node)));
        children.push(child.clone());
    }
}

/// 收集节点全部后代元素的标签名
pub fn descendant_tags(node: &Handle, tags: &mut Vec<String>) {
    for child in node.children.borrow().iter() {
        if let NodeData::Element { name, .. } = &child.data {
            tags.push(name.local.as_ref().to_string());
        }
        descendant_tags(child, tags);
    }
}
