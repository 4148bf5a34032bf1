/// In-page detection and rewriting of pasted or typed URLs
pub mod debounce;
pub mod editable;
pub mod matcher;
pub mod sites;

use crate::config::ScannerConfig;
use crate::link_data::LinkConversion;
use crate::messaging::{MessageChannel, Request};
use debounce::{Debouncer, Ticket};
use editable::{EditableProbe, is_editable};
use futures::future::join_all;
use matcher::{contains_url, extract_urls, replace_url};
use std::cell::Cell;
use std::rc::Rc;

/// A run of page text that can be read and rewritten in place
pub trait TextNode: Clone {
    fn text(&self) -> String;
    fn set_text(&self, text: &str);
}

/// What the scanner needs from the hosting page
pub trait PageContext {
    fn hostname(&self) -> String;
    fn now_ms(&self) -> f64;
    fn show_notification(&self, program: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    /// Waiting for settings; no listeners attached
    Disabled,
    Armed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub urls_found: usize,
    pub converted: usize,
}

pub struct PageScanner {
    channel: Rc<dyn MessageChannel>,
    page: Rc<dyn PageContext>,
    config: ScannerConfig,
    state: Cell<ScannerState>,
    input_debounce: Debouncer<u32>,
}

impl PageScanner {
    pub fn new(channel: Rc<dyn MessageChannel>, page: Rc<dyn PageContext>, config: ScannerConfig) -> Self {
        PageScanner {
            channel,
            page,
            config,
            state: Cell::new(ScannerState::Disabled),
            input_debounce: Debouncer::new(),
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state.get()
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    fn is_armed(&self) -> bool {
        self.state.get() == ScannerState::Armed
    }

    /// Ask the background whether the feature is on and arm if so
    pub async fn arm(&self) -> ScannerState {
        match self.channel.send(Request::GetSettings).await {
            Ok(response) => match response.settings() {
                Some(snapshot) if snapshot.is_enabled => self.state.set(ScannerState::Armed),
                Some(_) => log::info!("Link conversion is turned off"),
                None => log::warn!("Settings request failed: {:?}", response.error),
            },
            Err(e) => log::warn!("Could not reach background: {}", e),
        }
        self.state.get()
    }

    pub fn wants_paste(&self, pasted_text: &str) -> bool {
        self.is_armed() && contains_url(pasted_text)
    }

    pub fn wants_input(&self, target: &EditableProbe) -> bool {
        self.is_armed() && is_editable(target)
    }

    pub fn wants_mutation(&self, inserted_text: &str) -> bool {
        self.is_armed() && contains_url(inserted_text)
    }

    /// Start (or restart) the debounce window for an element
    pub fn schedule_input(&self, element_key: u32) -> Ticket {
        self.input_debounce.schedule(element_key)
    }

    /// True when this ticket is still the element's latest input
    pub fn take_input(&self, element_key: u32, ticket: Ticket) -> bool {
        self.input_debounce.fire(&element_key, ticket)
    }

    /// Convert every URL found in the given text runs.
    ///
    /// Requests are dispatched together; each result only touches its own node,
    /// and a failure for one URL does not affect the others.
    pub async fn scan<N: TextNode>(&self, nodes: &[N]) -> ScanReport {
        if !self.is_armed() {
            return ScanReport::default();
        }

        let jobs: Vec<(N, String)> = nodes
            .iter()
            .flat_map(|node| {
                extract_urls(&node.text())
                    .into_iter()
                    .map(|url| (node.clone(), url.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();

        let urls_found = jobs.len();
        let results = join_all(
            jobs.iter()
                .map(|(node, url)| self.convert_in_node(node, url)),
        )
        .await;

        ScanReport {
            urls_found,
            converted: results.iter().filter(|r| r.is_some()).count(),
        }
    }

    /// Convert one URL and substitute it in the node's current text.
    ///
    /// Returns the recorded conversion, or `None` when anything fails, the
    /// URL is already tagged, or the text no longer contains it.
    pub async fn convert_in_node<N: TextNode>(&self, node: &N, url: &str) -> Option<LinkConversion> {
        let response = match self.channel.send(Request::ConvertUrl { url: url.to_string() }).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Error converting URL {}: {}", url, e);
                return None;
            }
        };

        if !response.success {
            log::debug!("Left {} unchanged: {}", url, response.error.unwrap_or_default());
            return None;
        }

        let affiliate_url = response.affiliate_url?;
        if affiliate_url == url {
            return None;
        }

        let updated = replace_url(&node.text(), url, &affiliate_url)?;
        node.set_text(&updated);

        let program = response.program.unwrap_or_default();
        let conversion = LinkConversion::new(
            url.to_string(),
            affiliate_url,
            program.clone(),
            self.page.now_ms(),
            self.page.hostname(),
        );

        let log_request = Request::LogConversion {
            conversion: conversion.clone(),
        };
        if let Err(e) = self.channel.send(log_request).await {
            log::warn!("Failed to record conversion: {}", e);
        }

        self.page.show_notification(&program);
        Some(conversion)
    }
}
