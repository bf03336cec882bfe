#![allow(unused_macros)]
use rstest_reuse::template;

// This creates a testing "template" to allow for the injection of each
// pricing mechanism

#[template]
#[rstest]
#[case::up(lem_core::models::Mechanism::Up)]
#[case::aup(lem_core::models::Mechanism::Aup)]
#[case::mup(lem_core::models::Mechanism::Mup)]
#[case::upnr(lem_core::models::Mechanism::Upnr)]
#[case::apm(lem_core::models::Mechanism::Apm)]
#[case::mpas(lem_core::models::Mechanism::Mpas)]
#[case::cfrm(lem_core::models::Mechanism::Cfrm)]
#[case::wam(lem_core::models::Mechanism::Wam)]
#[case::mmp(lem_core::models::Mechanism::Mmp)]
#[case::ipa(lem_core::models::Mechanism::Ipa)]
#[case::vcg(lem_core::models::Mechanism::Vcg)]
#[case::nbs(lem_core::models::Mechanism::Nbs)]
#[case::cgt(lem_core::models::Mechanism::Cgt)]
#[case::cgts(lem_core::models::Mechanism::Cgts)]
#[case::colm(lem_core::models::Mechanism::Colm)]
pub fn all_mechanisms(#[case] mechanism: lem_core::models::Mechanism) -> () {}
