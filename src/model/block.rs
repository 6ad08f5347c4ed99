use chrono::{NaiveDate, NaiveDateTime};

use crate::error::SaltResult;
use crate::logic::{semester_for, SemesterTag};
use crate::model::{ElementView, Entity, FieldInfo, FieldSpec, NodeRef, Pointing, Target};

/// Top-level proposal unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    node: NodeRef,
}

impl Block {
    pub const CODE: FieldSpec<String> =
        FieldSpec::required("code", "./{/PIPT/Proposal/Phase2}BlockCode");
    pub const NAME: FieldSpec<String> = FieldSpec::required("name", "./{/PIPT/Proposal/Phase2}Name");
    pub const COMMENT: FieldSpec<String> = FieldSpec::required(
        "comment",
        "./{/PIPT/Proposal/Phase2}BlockSemester/{/PIPT/Proposal/Phase2}Comments",
    );
    pub const SEMESTER: FieldSpec<i32> = FieldSpec::required(
        "semester",
        "./{/PIPT/Proposal/Phase2}BlockSemester/{/PIPT/Proposal/Phase2}Semester",
    );
    pub const YEAR: FieldSpec<i32> = FieldSpec::required(
        "year",
        "./{/PIPT/Proposal/Phase2}BlockSemester/{/PIPT/Proposal/Phase2}Year",
    );
    pub const EXPIRY: FieldSpec<Option<NaiveDateTime>> = FieldSpec::defaulted(
        "expiry",
        "./{/PIPT/Proposal/Phase2}BlockSemester/{/PIPT/Proposal/Phase2}ExpiryDate",
        "",
    );

    const POINTINGS: &'static str = "./{/PIPT/Proposal/Phase2}SubBlock\
        /{/PIPT/Proposal/Phase2}SubSubBlock\
        /{/PIPT/Proposal/Phase2}Pointing";
    const TARGETS: &'static str = "./{/PIPT/Proposal/Phase2}SubBlock\
        /{/PIPT/Proposal/Phase2}SubSubBlock\
        /{/PIPT/Proposal/Phase2}Pointing\
        /{/PIPT/Proposal/Phase2}Observation\
        /{/PIPT/Proposal/Phase2}Acquisition\
        /{/PIPT/Proposal/Shared}Target";

    pub fn pointings(&self, doc: &ElementView) -> SaltResult<Vec<Pointing>> {
        doc.get_objects(Self::POINTINGS, Pointing::wrap, Some(self.node))
    }

    /// Every target of every observation in this block
    pub fn targets(&self, doc: &ElementView) -> SaltResult<Vec<Target>> {
        doc.get_objects(Self::TARGETS, Target::wrap, Some(self.node))
    }

    /// Stamp the semester and year that `as_of` falls into
    pub fn assign_semester(&self, doc: &mut ElementView, as_of: NaiveDate) -> SaltResult<SemesterTag> {
        let tag = semester_for(as_of);
        self.set(doc, &Self::YEAR, tag.year)?;
        self.set(doc, &Self::SEMESTER, tag.semester)?;
        Ok(tag)
    }
}

impl Entity for Block {
    const KIND: &'static str = "Block";
    const FIELDS: &'static [FieldInfo] = &[
        Self::CODE.info,
        Self::NAME.info,
        Self::COMMENT.info,
        Self::SEMESTER.info,
        Self::YEAR.info,
        Self::EXPIRY.info,
    ];

    fn wrap(node: NodeRef) -> Self {
        Self { node }
    }

    fn node(&self) -> NodeRef {
        self.node
    }
}
