// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Query heap descriptors.

use std::borrow::Cow;

/// The kind of value a query heap records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// Number of samples that passed the depth test.
    SamplesPassed,
    /// Whether any sample passed the depth test.
    AnySamplesPassed,
    /// Conservative variant of [`QueryType::AnySamplesPassed`].
    AnySamplesPassedConservative,
    /// Elapsed GPU time.
    TimeElapsed,
    /// Number of primitives written by stream output.
    StreamOutPrimitivesWritten,
    /// Whether stream output overflowed.
    StreamOutOverflow,
    /// Pipeline statistics.
    PipelineStatistics,
}

impl QueryType {
    /// Returns `true` for occlusion queries, the only ones usable as render condition.
    pub const fn is_occlusion(self) -> bool {
        matches!(
            self,
            QueryType::SamplesPassed
                | QueryType::AnySamplesPassed
                | QueryType::AnySamplesPassedConservative
        )
    }
}

/// A descriptor used to create a query heap.
#[derive(Debug, Clone)]
pub struct QueryHeapDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Kind of the queries.
    pub query_type: QueryType,
    /// Number of queries in the heap. Must be greater than zero.
    pub num_queries: u32,
    /// The queries are used for conditional rendering.
    pub render_condition: bool,
}

impl Default for QueryHeapDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            query_type: QueryType::SamplesPassed,
            num_queries: 1,
            render_condition: false,
        }
    }
}

/// An opaque handle to a query heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryHeapId(pub usize);
